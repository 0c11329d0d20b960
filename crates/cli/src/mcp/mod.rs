// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-tool server speaking MCP (JSON-RPC 2.0) over stdio or HTTP.
//!
//! Every tool that reaches the API asks the session guard for a token in
//! non-interactive mode, so an unrecoverable session surfaces as a tool
//! error instead of a browser window nobody is watching.

pub mod http;
pub mod resources;
pub mod stdio;
pub mod tools;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;

/// Protocol revision answered when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// CLI arguments for `quail mcp`.
#[derive(Debug, clap::Args)]
pub struct McpArgs {
    /// Serve over HTTP (`POST /mcp`) instead of stdio.
    #[arg(long)]
    pub http: bool,
    /// HTTP bind host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// HTTP bind port.
    #[arg(long, default_value_t = 8083)]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(RpcError { code, message: message.into() }) }
    }
}

/// Transport-independent request dispatcher.
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle one raw JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_text(&self, text: &str) -> Option<String> {
        let response = match serde_json::from_str::<Request>(text) {
            Ok(req) => self.handle(req).await?,
            Err(e) => Response::err(Value::Null, PARSE_ERROR, format!("parse error: {e}")),
        };
        match serde_json::to_string(&response) {
            Ok(s) => Some(s),
            Err(e) => Some(
                json!({"jsonrpc": "2.0", "id": null, "error": {"code": INTERNAL_ERROR, "message": e.to_string()}})
                    .to_string(),
            ),
        }
    }

    /// Dispatch a parsed request. Returns `None` for notifications.
    pub async fn handle(&self, req: Request) -> Option<Response> {
        debug!(method = %req.method, "mcp request");
        let Some(id) = req.id else {
            // Notifications (`notifications/initialized`, cancellations) need no answer.
            return None;
        };
        if req.jsonrpc != "2.0" {
            return Some(Response::err(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
        }

        let settings = &self.state.settings;
        let response = match req.method.as_str() {
            "initialize" => Response::ok(id, self.initialize(&req.params)),
            "ping" => Response::ok(id, json!({})),
            "tools/list" => Response::ok(id, json!({ "tools": tools::definitions() })),
            "tools/call" => {
                let Some(name) = req.params.get("name").and_then(Value::as_str) else {
                    return Some(Response::err(id, INVALID_PARAMS, "tools/call requires a tool name"));
                };
                let args = req.params.get("arguments").cloned().unwrap_or_else(|| json!({}));
                match tools::call(&self.state, name, &args).await {
                    Some(result) => match serde_json::to_value(result) {
                        Ok(v) => Response::ok(id, v),
                        Err(e) => Response::err(id, INTERNAL_ERROR, e.to_string()),
                    },
                    None => Response::err(id, INVALID_PARAMS, format!("unknown tool: {name}")),
                }
            }
            "resources/list" => Response::ok(id, json!({ "resources": resources::list(settings) })),
            "resources/read" => {
                let Some(uri) = req.params.get("uri").and_then(Value::as_str) else {
                    return Some(Response::err(id, INVALID_PARAMS, "resources/read requires a uri"));
                };
                match resources::read(&self.state, uri).await {
                    Ok(contents) => Response::ok(id, json!({ "contents": contents })),
                    Err(e) => Response::err(id, INTERNAL_ERROR, format!("{e:#}")),
                }
            }
            other => Response::err(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
        };
        Some(response)
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": {}, "resources": {} },
            "serverInfo": { "name": "quail", "version": env!("CARGO_PKG_VERSION") },
        })
    }
}

/// Run the MCP server until the input closes or shutdown is requested.
pub async fn serve(state: AppState, args: &McpArgs) -> anyhow::Result<()> {
    let server = Arc::new(McpServer::new(state));
    if args.http {
        http::serve(server, &args.host, args.port).await
    } else {
        stdio::serve(server, tokio::io::stdin(), tokio::io::stdout()).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
