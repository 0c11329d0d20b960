// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamable-HTTP transport: one JSON-RPC message per `POST /mcp`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{McpServer, Request, Response as RpcResponse, PARSE_ERROR};

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Build the axum `Router` for the MCP endpoint.
pub fn build_router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle(State(server): State<Arc<McpServer>>, body: String) -> Response {
    let req: Request = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            let rpc = RpcResponse::err(serde_json::Value::Null, PARSE_ERROR, format!("parse error: {e}"));
            return (StatusCode::BAD_REQUEST, Json(rpc)).into_response();
        }
    };
    let initialize = req.method == "initialize";
    let Some(rpc) = server.handle(req).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut resp = Json(rpc).into_response();
    if initialize {
        let session = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&session) {
            resp.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    resp.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

/// Bind `host:port` and serve until shutdown is requested.
pub async fn serve(server: Arc<McpServer>, host: &str, port: u16) -> anyhow::Result<()> {
    let shutdown = server.state().shutdown.clone();
    let listener = TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "mcp server listening on http");
    axum::serve(listener, build_router(server))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
