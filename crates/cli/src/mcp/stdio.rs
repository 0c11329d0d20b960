// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON-RPC over a byte stream (stdin/stdout in production).

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use super::McpServer;

/// Serve requests read from `input` until EOF or shutdown, one response line
/// per request. Requests are handled in arrival order.
pub async fn serve<R, W>(server: Arc<McpServer>, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("mcp server listening on stdio");
    let shutdown = server.state().shutdown.clone();
    let mut lines = BufReader::new(input).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = server.handle_text(&line).await {
            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }
    info!("mcp stdio closed");
    Ok(())
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
