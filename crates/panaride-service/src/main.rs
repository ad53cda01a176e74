//! Panaride HTTP facade.
//!
//! Serves the informational metadata document, Kubernetes-style health
//! probes, and HTTP tool dispatch against the same server state the stdio
//! MCP transport uses. CORS is permissive: browser clients talk to this
//! service directly.
//!
//! # Endpoints
//!
//! - `GET /` - Server metadata: name, version, status, endpoints, tools
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /api/v1/tools` - Tool catalog with input schemas
//! - `POST /api/v1/tools/call` - Dispatch a named tool call
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `SUPABASE_URL` / `SUPABASE_SERVICE_KEY` - Collection store
//! - `BASE_FARE_BS`, `PER_KM_BS`, `PER_MIN_BS`, `MIN_FARE_BS`,
//!   `FUEL_PRICE_BS`, `USD_EXCHANGE_RATE` - Fare configuration
//! - `RUST_LOG` - Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use panaride_lib::{FareConfig, StoreConfig};
use panaride_mcp::{tool_catalog, tool_names, ServerState};

/// Default store project URL, overridable via `SUPABASE_URL`.
const DEFAULT_STORE_URL: &str = "https://mdaksestqxfdxpirudsc.supabase.co";

type AppState = Arc<ServerState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = Arc::new(
        ServerState::new(fare_config_from_env(), store_config_from_env()).map_err(|e| {
            error!(error = %e, "failed to initialize server state");
            e
        })?,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Build the router. Split out of `main` so tests can drive it in-process.
fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/api/v1/tools", get(tools_handler))
        .route("/api/v1/tools/call", post(tool_call_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle `GET /`: static server metadata.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.server_info();
    Json(json!({
        "name": info.name,
        "version": info.version,
        "status": info.status,
        "endpoints": {
            "tools": "/api/v1/tools",
            "tools_call": "/api/v1/tools/call",
            "health": "/health/live",
        },
        "tools": info.tools,
        "features": info.features,
    }))
}

async fn health_live() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_ready() -> impl IntoResponse {
    let tools = tool_names();
    if tools.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not_ready: no tools registered"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "tools_loaded": tools.len(),
        })),
    )
}

/// Handle `GET /api/v1/tools`: the catalog with input schemas.
async fn tools_handler() -> impl IntoResponse {
    Json(json!({ "tools": tool_catalog() }))
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handle `POST /api/v1/tools/call`.
///
/// Unknown tools and malformed arguments are caller errors (404/400). Tool
/// failures keep the 200 + `{success: false, error}` contract the stdio
/// transport uses, so both surfaces behave identically.
async fn tool_call_handler(
    State(state): State<AppState>,
    Json(request): Json<ToolCallRequest>,
) -> impl IntoResponse {
    let arguments = if request.arguments.is_null() {
        json!({})
    } else {
        request.arguments
    };

    match state.call_tool(&request.name, arguments).await {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(err) if err.is_unknown_tool() => {
            (StatusCode::NOT_FOUND, Json(serde_json::to_value(&err).unwrap_or_default()))
        }
        Err(err) if err.code == 400 => {
            (StatusCode::BAD_REQUEST, Json(serde_json::to_value(&err).unwrap_or_default()))
        }
        Err(err) => {
            error!(tool = %request.name, error = %err, "tool call failed");
            (
                StatusCode::OK,
                Json(json!({ "success": false, "error": err.message })),
            )
        }
    }
}

fn fare_config_from_env() -> FareConfig {
    let defaults = FareConfig::default();
    FareConfig {
        base_fare: env_f64("BASE_FARE_BS", defaults.base_fare),
        per_km: env_f64("PER_KM_BS", defaults.per_km),
        per_min: env_f64("PER_MIN_BS", defaults.per_min),
        min_fare: env_f64("MIN_FARE_BS", defaults.min_fare),
        fuel_price: env_f64("FUEL_PRICE_BS", defaults.fuel_price),
        fallback_usd_rate: env_f64("USD_EXCHANGE_RATE", defaults.fallback_usd_rate),
    }
}

fn store_config_from_env() -> StoreConfig {
    StoreConfig {
        base_url: env::var("SUPABASE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string()),
        service_key: env::var("SUPABASE_SERVICE_KEY").unwrap_or_default(),
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    fn test_app() -> TestServer {
        let state = Arc::new(
            ServerState::new(
                FareConfig::default(),
                StoreConfig {
                    base_url: "https://store.invalid".to_string(),
                    service_key: "test-key".to_string(),
                },
            )
            .unwrap(),
        );
        TestServer::new(app(state)).unwrap()
    }

    #[tokio::test]
    async fn root_returns_metadata_document() {
        let server = test_app();
        let response = server.get("/").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["name"], "Panaride MCP Server");
        assert_eq!(body["status"], "running");
        assert_eq!(body["tools"].as_array().unwrap().len(), 7);
        assert!(body["endpoints"]["tools_call"].is_string());
    }

    #[tokio::test]
    async fn health_probes_answer_ok() {
        let server = test_app();
        server.get("/health/live").await.assert_status_ok();

        let response = server.get("/health/ready").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["tools_loaded"], 7);
    }

    #[tokio::test]
    async fn tools_endpoint_lists_catalog_with_schemas() {
        let server = test_app();
        let response = server.get("/api/v1/tools").await;
        response.assert_status_ok();

        let body: Value = response.json();
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[tokio::test]
    async fn tool_call_prices_a_local_fare() {
        let server = test_app();
        let response = server
            .post("/api/v1/tools/call")
            .json(&json!({
                "name": "calcular_tarifa",
                "arguments": {"distancia_km": 15.0, "duracion_min": 45.0}
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["tarifa"]["amount_bs"], 55.5);
    }

    #[tokio::test]
    async fn tool_call_computes_distance() {
        let server = test_app();
        let response = server
            .post("/api/v1/tools/call")
            .json(&json!({
                "name": "calcular_distancia",
                "arguments": {
                    "origen": {"latitud": 10.4806, "longitud": -66.9036},
                    "destino": {"latitud": 10.5061, "longitud": -66.9146}
                }
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert!(body["distancia_km"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_404_problem() {
        let server = test_app();
        let response = server
            .post("/api/v1/tools/call")
            .json(&json!({"name": "nonexistent_tool", "arguments": {}}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_a_400() {
        let server = test_app();
        let response = server
            .post("/api/v1/tools/call")
            .json(&json!({"name": "calcular_distancia", "arguments": {"origen": 5}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_keeps_the_structured_contract() {
        let server = test_app();
        let response = server
            .post("/api/v1/tools/call")
            .json(&json!({
                "name": "buscar_conductores_disponibles",
                "arguments": {"latitud": 10.48, "longitud": -66.90}
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}
