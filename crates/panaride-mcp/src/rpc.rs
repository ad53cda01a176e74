//! JSON-RPC 2.0 stdio transport.
//!
//! Line-delimited requests on stdin, one response line per request on stdout.
//! Logging goes to stderr only; a single stray line on stdout corrupts the
//! protocol stream. Messages without an `id` are notifications and get no
//! response.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::server::{tool_catalog, ServerState, SERVER_NAME};

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Read requests from stdin until EOF, answering on stdout.
pub async fn run(state: ServerState) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(request) => handle_request(&state, request).await,
            Err(err) => {
                warn!(error = %err, "failed to parse request line");
                Some(error_response(
                    Value::Null,
                    -32700,
                    format!("Parse error: {err}"),
                ))
            }
        };

        if let Some(response) = response {
            let mut out = response.to_string();
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// Handle a single decoded request. Returns `None` for notifications.
pub async fn handle_request(state: &ServerState, request: Value) -> Option<Value> {
    let id = match request.get("id") {
        Some(id) if !id.is_null() => id.clone(),
        _ => {
            debug!(method = ?request.get("method"), "ignoring notification");
            return None;
        }
    };

    if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Some(error_response(
            id,
            -32600,
            "Invalid request: expected jsonrpc 2.0",
        ));
    }

    let method = match request.get("method").and_then(Value::as_str) {
        Some(method) => method,
        None => return Some(error_response(id, -32600, "Invalid request: missing method")),
    };
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    debug!(method, "handling request");

    let response = match method {
        "initialize" => success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {
                    "tools": {},
                    "resources": {},
                },
            }),
        ),
        "tools/list" => success_response(id, json!({ "tools": tool_catalog() })),
        "tools/call" => handle_tool_call(state, id, params).await,
        "resources/list" => success_response(id, json!({ "resources": state.resources() })),
        "resources/read" => handle_resource_read(state, id, params).await,
        "prompts/list" => success_response(id, json!({ "prompts": [] })),
        other => error_response(id, -32601, format!("Method not found: {other}")),
    };

    Some(response)
}

async fn handle_tool_call(state: &ServerState, id: Value, params: Value) -> Value {
    let name = match params.get("name").and_then(Value::as_str) {
        Some(name) => name,
        None => return error_response(id, -32602, "Invalid params: missing tool name"),
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match state.call_tool(name, arguments).await {
        Ok(payload) => success_response(
            id,
            json!({
                "content": [{ "type": "text", "text": to_pretty(&payload) }],
            }),
        ),
        Err(err) if err.is_unknown_tool() => error_response(id, -32601, err.message),
        Err(err) => {
            // Tool failures stay inside the result payload, matching the
            // structured `{success: false, error}` contract.
            let failure = json!({ "success": false, "error": err.message });
            success_response(
                id,
                json!({
                    "content": [{ "type": "text", "text": to_pretty(&failure) }],
                    "isError": true,
                }),
            )
        }
    }
}

async fn handle_resource_read(state: &ServerState, id: Value, params: Value) -> Value {
    let uri = match params.get("uri").and_then(Value::as_str) {
        Some(uri) => uri,
        None => return error_response(id, -32602, "Invalid params: missing resource uri"),
    };

    match state.read_resource(uri).await {
        Ok(text) => success_response(
            id,
            json!({
                "contents": [{
                    "uri": uri,
                    "mimeType": "application/json",
                    "text": text,
                }],
            }),
        ),
        Err(err) => error_response(id, -32602, err.message),
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message.into() } })
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use panaride_lib::{FareConfig, StoreConfig};

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

    #[tokio::test]
    async fn initialize_reports_protocol_and_capabilities() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert!(response["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn tools_list_returns_catalog() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}),
        )
        .await
        .unwrap();

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[tokio::test]
    async fn tools_call_wraps_payload_in_content() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "calcular_tarifa",
                    "arguments": {"distancia_km": 15.0, "duracion_min": 45.0}
                }
            }),
        )
        .await
        .unwrap();

        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["success"], true);
        assert_eq!(payload["tarifa"]["amount_bs"], 55.5);
        assert!(response["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn unknown_tool_maps_to_method_not_found() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "nonexistent_tool", "arguments": {}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32601);
        assert!(response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unknown tool"));
    }

    #[tokio::test]
    async fn store_failure_becomes_structured_payload() {
        // The test store URL does not resolve, so the driver search fails
        // upstream; the response must still be a result with isError.
        let state = test_state();
        let response = handle_request(
            &state,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {
                    "name": "buscar_conductores_disponibles",
                    "arguments": {"latitud": 10.48, "longitud": -66.90}
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_jsonrpc_version_is_rejected() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "1.0", "id": 6, "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "2.0", "id": 7, "method": "bogus/method", "params": {}}),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn prompts_list_is_empty() {
        let state = test_state();
        let response = handle_request(
            &state,
            json!({"jsonrpc": "2.0", "id": 8, "method": "prompts/list", "params": {}}),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["prompts"].as_array().unwrap().len(), 0);
    }
}
