//! stdio transport for MCP JSON-RPC

use crate::console::ConsoleServer;
use crate::mcp::{
    InitializeParams, InitializeResult, ListChangedCapability, Notification, PROTOCOL_VERSION,
    Request, RequestId, ResourcesCapability, Response, ServerCapabilities, ServerInfo,
};
use crate::tools::{handle_tool_call, list_tools, status_text};
use crate::{BedrockMcpServer, SERVER_NAME};
use bedrock_core::{BedrockError, Result, error_codes};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Lines returned when reading the `bedrock://logs` resource
const LOG_RESOURCE_LINES: usize = 100;

/// Run the MCP server on stdio
pub async fn run<S: ConsoleServer>(server: BedrockMcpServer<S>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    info!("Bedrock MCP server starting on stdio");

    // Forward console lines as log notifications if requested and supported
    let log_rx = if server.forward_logs {
        server.console.subscribe_logs()
    } else {
        None
    };

    let stdout_for_logs = stdout.clone();
    let _log_task = log_rx.map(|mut rx| {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(entry) => {
                        let notification = Notification::console_line(entry.to_string());
                        match serde_json::to_string(&notification) {
                            Ok(json) => {
                                let mut out = stdout_for_logs.lock().await;
                                if let Err(e) = write_line(&mut *out, &json).await {
                                    error!("Failed to write log notification: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Failed to serialize notification: {}", e);
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Console log channel closed");
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Log forwarder lagged, missed {} lines", n);
                    }
                }
            }
        })
    });

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| BedrockError::IpcError(format!("Failed to read stdin: {}", e)))?;

        if bytes_read == 0 {
            // EOF - client disconnected
            info!("Client disconnected (EOF)");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let request: Request = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                continue;
            }
        };

        let Some(response) = handle_request(&request, &server).await else {
            debug!("Notification {} handled", request.method);
            continue;
        };
        let response_json = serde_json::to_string(&response)?;

        debug!("Sending: {}", response_json);

        let mut out = stdout.lock().await;
        write_line(&mut *out, &response_json).await?;
    }

    // Give the game server a graceful stop instead of dying with the bridge
    if server.console.status().await.running {
        info!("Stopping Bedrock server before exit");
        server.console.stop().await;
    }

    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, json: &str) -> Result<()> {
    out.write_all(json.as_bytes())
        .await
        .map_err(|e| BedrockError::IpcError(format!("Failed to write stdout: {}", e)))?;
    out.write_all(b"\n")
        .await
        .map_err(|e| BedrockError::IpcError(format!("Failed to write newline: {}", e)))?;
    out.flush()
        .await
        .map_err(|e| BedrockError::IpcError(format!("Failed to flush stdout: {}", e)))?;
    Ok(())
}

/// Dispatch one request. Notifications produce no response.
pub async fn handle_request<S: ConsoleServer>(
    request: &Request,
    server: &BedrockMcpServer<S>,
) -> Option<Response> {
    let id = request.id.clone()?;
    let response = match request.method.as_str() {
        "initialize" => handle_initialize(request, id),
        "initialized" | "notifications/initialized" => Response::success(id, serde_json::json!({})),
        "ping" => Response::success(id, serde_json::json!({})),
        "tools/list" => Response::success(id, serde_json::json!({ "tools": list_tools() })),
        "tools/call" => handle_tools_call(request, id, server).await,
        "resources/list" => handle_resources_list(id),
        "resources/read" => handle_resources_read(request, id, server).await,
        "prompts/list" => Response::success(id, serde_json::json!({ "prompts": [] })),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    };
    Some(response)
}

fn handle_initialize(request: &Request, id: RequestId) -> Response {
    let params: InitializeParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid initialize params: {}", e),
            );
        }
    };
    info!(
        "Client {} {} connected (protocol {})",
        params.client_info.name, params.client_info.version, params.protocol_version
    );

    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ListChangedCapability {
                list_changed: false,
            },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
            prompts: ListChangedCapability {
                list_changed: false,
            },
            logging: serde_json::json!({}),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    match serde_json::to_value(result) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

async fn handle_tools_call<S: ConsoleServer>(
    request: &Request,
    id: RequestId,
    server: &BedrockMcpServer<S>,
) -> Response {
    #[derive(serde::Deserialize)]
    struct ToolCallParams {
        name: String,
        #[serde(default)]
        arguments: serde_json::Value,
    }

    let params: ToolCallParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid tool call params: {}", e),
            );
        }
    };

    handle_tool_call(&params.name, params.arguments, id, &server.console).await
}

fn handle_resources_list(id: RequestId) -> Response {
    let resources = vec![
        serde_json::json!({
            "uri": "bedrock://status",
            "name": "Server Status",
            "description": "Process state and online players",
            "mimeType": "application/json"
        }),
        serde_json::json!({
            "uri": "bedrock://logs",
            "name": "Console Log",
            "description": "Most recent console lines",
            "mimeType": "text/plain"
        }),
    ];

    Response::success(id, serde_json::json!({ "resources": resources }))
}

async fn handle_resources_read<S: ConsoleServer>(
    request: &Request,
    id: RequestId,
    server: &BedrockMcpServer<S>,
) -> Response {
    #[derive(serde::Deserialize)]
    struct ReadParams {
        uri: String,
    }

    let params: ReadParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid read params: {}", e),
            );
        }
    };

    let (mime_type, text) = match params.uri.as_str() {
        "bedrock://status" => {
            let status = server.console.status().await;
            match serde_json::to_string(&status) {
                Ok(json) => ("application/json", json),
                Err(_) => ("text/plain", status_text(&status)),
            }
        }
        "bedrock://logs" => (
            "text/plain",
            server
                .console
                .recent_logs(LOG_RESOURCE_LINES)
                .await
                .join("\n"),
        ),
        _ => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown resource: {}", params.uri),
            );
        }
    };

    Response::success(
        id,
        serde_json::json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": mime_type,
                "text": text
            }]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bedrock_core::{CommandTelemetry, ServerStatus};

    struct IdleConsole;

    #[async_trait]
    impl ConsoleServer for IdleConsole {
        async fn start(&self) -> Result<()> {
            Err(BedrockError::ExecutableNotFound("/srv/bedrock".into()))
        }

        async fn stop(&self) {}

        async fn send(&self, _command: &str) -> Result<CommandTelemetry> {
            Err(BedrockError::NotRunning)
        }

        async fn status(&self) -> ServerStatus {
            ServerStatus {
                running: false,
                player_count: 0,
                player_list: Vec::new(),
                pid: None,
            }
        }

        async fn recent_logs(&self, _lines: usize) -> Vec<String> {
            vec!["No logs available".to_string()]
        }
    }

    fn server() -> BedrockMcpServer<IdleConsole> {
        BedrockMcpServer::new(Arc::new(IdleConsole))
    }

    fn request(json: serde_json::Value) -> Request {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let req = request(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": {"name": "inspector", "version": "1.0"}
            }
        }));
        let resp = handle_request(&req, &server()).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let req = request(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }));
        assert!(handle_request(&req, &server()).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let req = request(serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "sampling/create"}));
        let resp = handle_request(&req, &server()).await.unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_failure_is_tool_text() {
        let req = request(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "start-server"}
        }));
        let resp = handle_request(&req, &server()).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Error executing start-server: Bedrock server executable not found in /srv/bedrock"
        );
    }

    #[tokio::test]
    async fn test_read_status_resource() {
        let req = request(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "resources/read",
            "params": {"uri": "bedrock://status"}
        }));
        let resp = handle_request(&req, &server()).await.unwrap();
        let text = resp.result.unwrap()["contents"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        let status: ServerStatus = serde_json::from_str(&text).unwrap();
        assert!(!status.running);
        assert_eq!(status.pid, None);
    }
}
