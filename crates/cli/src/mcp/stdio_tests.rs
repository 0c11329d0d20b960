// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde_json::Value;

use super::*;
use crate::test_support::logged_in;

#[tokio::test]
async fn one_line_per_request() -> anyhow::Result<()> {
    let (_mock, _dir, state) = logged_in().await?;
    let server = Arc::new(McpServer::new(state));
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        "\n",
        "garbage\n",
    );
    let mut output: Vec<u8> = Vec::new();
    serve(server, input.as_bytes(), &mut output).await?;

    let replies: Vec<Value> = String::from_utf8(output)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "quail");
    assert_eq!(replies[1]["id"], 2);
    assert_eq!(replies[2]["error"]["code"], crate::mcp::PARSE_ERROR);
    Ok(())
}

#[tokio::test]
async fn stops_on_shutdown() -> anyhow::Result<()> {
    let (_mock, _dir, state) = logged_in().await?;
    state.shutdown.cancel();
    let server = Arc::new(McpServer::new(state));
    // A reader that never yields a line.
    let (_keep_open, reader) = tokio::io::duplex(64);
    let mut output: Vec<u8> = Vec::new();
    tokio::time::timeout(std::time::Duration::from_secs(5), serve(server, reader, &mut output)).await??;
    assert!(output.is_empty());
    Ok(())
}
