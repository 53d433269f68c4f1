//! Line-delimited JSON-RPC server.
//!
//! Reads one message per line, answers requests on the writer in the order
//! they arrive and stays silent for notifications. Nothing but protocol
//! messages is ever written to the writer.

use std::time::Instant;

use serde_json::{json, Value};
use sitewatch_core::metrics::METRICS;
use sitewatch_core::obs;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolCallResult,
    INTERNAL_ERROR, PROTOCOL_VERSION,
};
use crate::tools::SitewatchTools;

pub const SERVER_NAME: &str = "sitewatch";

pub struct McpServer {
    tools: SitewatchTools,
}

impl McpServer {
    pub fn new(tools: SitewatchTools) -> Self {
        Self { tools }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve `reader` until EOF, writing responses to `writer`.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("{} {} listening on stdio", SERVER_NAME, sitewatch_core::VERSION);
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw message; `None` when no response is due.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => {
                let id = message.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<JsonRpcRequest>(message) {
                    Ok(request) => self.handle_request(request).await?,
                    Err(e) => {
                        debug!(error = %e, "malformed request");
                        JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e))
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "unparsable message");
                JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e))
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification received");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err),
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": sitewatch_core::VERSION,
            }
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ToolCallParams =
            serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?;

        METRICS.inc_tool_calls();
        let started = Instant::now();
        let outcome = self.tools.call(&params.name, params.arguments).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match outcome {
            Ok(text) => {
                obs::emit_tool_called(&params.name, duration_ms);
                ToolCallResult::text(text)
            }
            Err(e) if e.is_caller_error() => {
                obs::emit_tool_failed(&params.name, &e);
                METRICS.inc_tool_failures();
                return Err(JsonRpcError::invalid_params(e));
            }
            Err(e) => {
                obs::emit_tool_failed(&params.name, &e);
                METRICS.inc_tool_failures();
                ToolCallResult::error(format!("{} failed: {}", params.name, e))
            }
        };

        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
    }
}
