//! Server state, tool catalog, and dispatch.
//!
//! One [`ServerState`] lives for the process lifetime. It owns the collection
//! store client and the fare engine; the engine sits behind a mutex so tool
//! calls against it are serialized, which is what the exchange-rate cache
//! expects.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::info;

use panaride_lib::{DolarApiSource, FareConfig, FareEngine, RateSource, Store, StoreConfig};

use crate::tools::*;
use crate::types::*;
use crate::Error;

/// Wire name of the MCP server.
pub const SERVER_NAME: &str = "panaride";

/// Main server state shared by all request handlers.
pub struct ServerState {
    store: Store,
    engine: Mutex<FareEngine>,
    fare_config: FareConfig,
    started_at: DateTime<Utc>,
}

/// Descriptor for one catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Descriptor for one MCP resource exposed by the server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Static server metadata, also served by the HTTP facade.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub tools: Vec<&'static str>,
    pub features: Vec<&'static str>,
    pub started_at: String,
}

impl ServerState {
    /// Build the state with the production DolarAPI rate source.
    pub fn new(fare_config: FareConfig, store_config: StoreConfig) -> crate::Result<Self> {
        let source = DolarApiSource::new().map_err(|e| Error::internal(e.to_string()))?;
        Self::with_rate_source(fare_config, store_config, Box::new(source))
    }

    /// Build the state with an injected rate source (tests, mirrors).
    pub fn with_rate_source(
        fare_config: FareConfig,
        store_config: StoreConfig,
        source: Box<dyn RateSource>,
    ) -> crate::Result<Self> {
        let store = Store::new(store_config).map_err(|e| Error::internal(e.to_string()))?;

        info!(
            base_fare = fare_config.base_fare,
            min_fare = fare_config.min_fare,
            "fare engine configured"
        );

        Ok(Self {
            store,
            engine: Mutex::new(FareEngine::new(fare_config, source)),
            fare_config,
            started_at: Utc::now(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &Mutex<FareEngine> {
        &self.engine
    }

    /// Dispatch a named tool call with raw JSON arguments.
    ///
    /// Unknown names yield [`Error::unknown_tool`]; malformed arguments yield
    /// [`Error::invalid_params`]; everything else a tool can fail on comes
    /// back as [`Error::upstream`].
    pub async fn call_tool(&self, name: &str, arguments: Value) -> crate::Result<Value> {
        match name {
            "buscar_conductores_disponibles" => {
                to_payload(SearchDriversTool::execute(self, parse_input(arguments)?).await?)
            }
            "crear_viaje" => {
                to_payload(CreateRideTool::execute(self, parse_input(arguments)?).await?)
            }
            "calcular_tarifa" => {
                to_payload(FareQuoteTool::execute(self, parse_input(arguments)?).await?)
            }
            "actualizar_ubicacion_conductor" => {
                to_payload(UpdateLocationTool::execute(self, parse_input(arguments)?).await?)
            }
            "obtener_estadisticas_conductor" => {
                to_payload(DriverStatsTool::execute(self, parse_input(arguments)?).await?)
            }
            "completar_viaje" => {
                to_payload(CompleteRideTool::execute(self, parse_input(arguments)?).await?)
            }
            "calcular_distancia" => {
                to_payload(DistanceTool::execute(parse_input(arguments)?).await?)
            }
            _ => Err(Error::unknown_tool(name)),
        }
    }

    /// List MCP resources exposed by this server.
    pub fn resources(&self) -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor {
                uri: "panaride://server/info",
                title: "Server Info",
                description: "Server metadata: name, version, status, tool list, features",
            },
            ResourceDescriptor {
                uri: "panaride://pricing/config",
                title: "Pricing Config",
                description: "Active fare configuration: base fare, per-km/per-min rates, minimum fare",
            },
        ]
    }

    /// Read a resource by URI, returning its JSON body as text.
    pub async fn read_resource(&self, uri: &str) -> crate::Result<String> {
        match uri {
            "panaride://server/info" => serde_json::to_string(&self.server_info())
                .map_err(|e| Error::internal(e.to_string())),
            "panaride://pricing/config" => serde_json::to_string(&self.fare_config)
                .map_err(|e| Error::internal(e.to_string())),
            _ => Err(Error::new(404, format!("Unknown resource: {uri}"))
                .with_type("https://panaride.local/errors/unknown-resource")),
        }
    }

    /// Static server metadata for the info resource and HTTP facade.
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: "Panaride MCP Server",
            version: env!("CARGO_PKG_VERSION"),
            status: "running",
            tools: tool_names(),
            features: vec![
                "Integración con DolarAPI para tasa BCV en tiempo real",
                "Cálculo de tarifas con múltiples factores",
                "Búsqueda de conductores por geolocalización",
                "Cálculos geográficos precisos (Haversine)",
            ],
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("fare_config", &self.fare_config)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// The fixed, statically declared tool catalog.
pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "buscar_conductores_disponibles",
            description:
                "Busca conductores disponibles en un radio específico alrededor de una ubicación",
            input_schema: schema_value::<SearchDriversInput>(),
        },
        ToolDescriptor {
            name: "crear_viaje",
            description: "Crea una nueva solicitud de viaje con origen y destino",
            input_schema: schema_value::<CreateRideInput>(),
        },
        ToolDescriptor {
            name: "calcular_tarifa",
            description: "Calcula la tarifa estimada de un viaje basado en distancia y duración",
            input_schema: schema_value::<FareQuoteInput>(),
        },
        ToolDescriptor {
            name: "actualizar_ubicacion_conductor",
            description: "Actualiza la ubicación en tiempo real de un conductor",
            input_schema: schema_value::<UpdateLocationInput>(),
        },
        ToolDescriptor {
            name: "obtener_estadisticas_conductor",
            description: "Obtiene estadísticas de rendimiento de un conductor",
            input_schema: schema_value::<DriverStatsInput>(),
        },
        ToolDescriptor {
            name: "completar_viaje",
            description: "Marca un viaje como completado y calcula la tarifa final",
            input_schema: schema_value::<CompleteRideInput>(),
        },
        ToolDescriptor {
            name: "calcular_distancia",
            description: "Calcula la distancia entre dos puntos geográficos",
            input_schema: schema_value::<DistanceInput>(),
        },
    ]
}

/// Names of every catalog tool, in catalog order.
pub fn tool_names() -> Vec<&'static str> {
    tool_catalog().into_iter().map(|tool| tool.name).collect()
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}))
}

fn parse_input<T: DeserializeOwned>(arguments: Value) -> crate::Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::invalid_params(e.to_string()))
}

fn to_payload<T: Serialize>(output: T) -> crate::Result<Value> {
    serde_json::to_value(output).map_err(|e| Error::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ServerState {
        ServerState::new(
            FareConfig::default(),
            StoreConfig {
                base_url: "https://store.invalid".to_string(),
                service_key: "test-key".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn catalog_lists_all_seven_tools() {
        let catalog = tool_catalog();
        assert_eq!(catalog.len(), 7);

        let names = tool_names();
        for expected in [
            "buscar_conductores_disponibles",
            "crear_viaje",
            "calcular_tarifa",
            "actualizar_ubicacion_conductor",
            "obtener_estadisticas_conductor",
            "completar_viaje",
            "calcular_distancia",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn catalog_schemas_are_objects_with_properties() {
        for tool in tool_catalog() {
            let props = tool.input_schema.get("properties");
            assert!(props.is_some(), "{} has no properties", tool.name);
        }
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_tool() {
        let state = test_state();
        let err = state
            .call_tool("herramienta_inexistente", json!({}))
            .await
            .unwrap_err();
        assert!(err.is_unknown_tool());
        assert!(err.message.contains("herramienta_inexistente"));
    }

    #[tokio::test]
    async fn dispatch_rejects_malformed_arguments() {
        let state = test_state();
        let err = state
            .call_tool("calcular_distancia", json!({"origen": "not an object"}))
            .await
            .unwrap_err();
        assert_eq!(err.code, 400);
    }

    #[tokio::test]
    async fn dispatch_runs_distance_tool() {
        let state = test_state();
        let payload = state
            .call_tool(
                "calcular_distancia",
                json!({
                    "origen": {"latitud": 10.4806, "longitud": -66.9036},
                    "destino": {"latitud": 10.4806, "longitud": -66.9036}
                }),
            )
            .await
            .unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["distancia_km"], 0.0);
    }

    #[tokio::test]
    async fn dispatch_runs_local_fare_quote_without_network() {
        let state = test_state();
        let payload = state
            .call_tool(
                "calcular_tarifa",
                json!({"distancia_km": 15.0, "duracion_min": 45.0}),
            )
            .await
            .unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["tarifa"]["amount_bs"], 55.5);
        assert_eq!(payload["tarifa"]["currency"], "BS");
    }

    #[tokio::test]
    async fn dispatch_runs_usd_fare_quote_with_injected_source() {
        use async_trait::async_trait;

        struct FixedSource(f64);

        #[async_trait]
        impl panaride_lib::RateSource for FixedSource {
            async fn fetch_rate(&self) -> panaride_lib::Result<f64> {
                Ok(self.0)
            }
        }

        let state = ServerState::with_rate_source(
            FareConfig::default(),
            StoreConfig {
                base_url: "https://store.invalid".to_string(),
                service_key: "test-key".to_string(),
            },
            Box::new(FixedSource(37.0)),
        )
        .unwrap();

        let payload = state
            .call_tool(
                "calcular_tarifa",
                json!({"distancia_km": 15.0, "duracion_min": 45.0, "moneda": "USD"}),
            )
            .await
            .unwrap();

        assert_eq!(payload["tarifa"]["currency"], "USD");
        assert_eq!(payload["tarifa"]["amount_bs"], 55.5);
        assert_eq!(payload["tarifa"]["exchange_rate"], 37.0);
        assert_eq!(payload["tarifa"]["amount_usd"], 1.5);
        assert_eq!(payload["tarifa"]["used_fallback_rate"], false);
    }

    #[tokio::test]
    async fn resources_read_server_info() {
        let state = test_state();
        let text = state.read_resource("panaride://server/info").await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["status"], "running");
        assert_eq!(value["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn resources_read_pricing_config() {
        let state = test_state();
        let text = state
            .read_resource("panaride://pricing/config")
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["base_fare"], 3.0);
        assert_eq!(value["min_fare"], 5.0);
    }

    #[tokio::test]
    async fn resources_read_unknown_uri_fails() {
        let state = test_state();
        let err = state.read_resource("panaride://nope").await.unwrap_err();
        assert_eq!(err.code, 404);
    }
}
