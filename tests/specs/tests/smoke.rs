// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that run the real `quail` binary against a mock
//! Quaily server and an isolated credential store.

use std::time::Duration;

use serde_json::{json, Value};

use quail::credential::store::CredentialStore;
use quail::test_support::{ann, token_body, tokens_expiring_in, MockQuaily};
use quail_specs::{stderr, stdout, Sandbox};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Seed `sandbox` with a session expiring `offset` from now.
fn seed(sandbox: &Sandbox, refresh: Option<&str>, offset: time::Duration) -> anyhow::Result<CredentialStore> {
    let store = CredentialStore::new(sandbox.store_path());
    store.save_login(&tokens_expiring_in("seeded-access", refresh, offset))?;
    store.save_identity(&ann())?;
    Ok(store)
}

// -- Local commands -----------------------------------------------------------

#[tokio::test]
async fn version() -> anyhow::Result<()> {
    let out = Sandbox::new()?.run(&["version"]).await?;
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("quail "));
    Ok(())
}

#[tokio::test]
async fn invalid_format_is_usage_error() -> anyhow::Result<()> {
    let out = Sandbox::new()?.run(&["status", "--format", "yaml"]).await?;
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("invalid format"));
    Ok(())
}

#[tokio::test]
async fn status_and_logout_without_session() -> anyhow::Result<()> {
    let sandbox = Sandbox::new()?;
    let out = sandbox.run(&["status"]).await?;
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("Not logged in"));

    let out = sandbox.run(&["logout"]).await?;
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "No session stored.");
    Ok(())
}

#[tokio::test]
async fn status_then_logout_with_session() -> anyhow::Result<()> {
    let sandbox = Sandbox::new()?;
    let store = seed(&sandbox, Some("rt"), time::Duration::hours(1))?;

    let out = sandbox.run(&["status", "--format", "json"]).await?;
    assert!(out.status.success());
    let status: Value = serde_json::from_str(&stdout(&out))?;
    assert_eq!(status["logged_in"], true);
    assert_eq!(status["user"]["name"], "Ann Author");

    let out = sandbox.run(&["logout"]).await?;
    assert_eq!(stdout(&out).trim(), "Logged out.");
    assert!(store.load()?.is_none());
    Ok(())
}

// -- Login failures -----------------------------------------------------------

#[tokio::test]
async fn login_timeout_prints_url_and_exits_3() -> anyhow::Result<()> {
    let sandbox = Sandbox::new()?;
    let out = sandbox.run(&["login"]).await?;
    assert_eq!(out.status.code(), Some(3));
    let err = stderr(&out);
    assert!(err.contains("/oauth/authorize?"), "{err}");
    assert!(err.contains("AUTHORIZATION_FAILED"), "{err}");
    assert!(!sandbox.store_path().exists());
    Ok(())
}

#[tokio::test]
async fn expired_session_with_failed_refresh_exits_3() -> anyhow::Result<()> {
    let mock = MockQuaily::start(vec![(400, r#"{"error":"invalid_grant"}"#.into())]).await?;
    let sandbox = Sandbox::with_base(&mock.base())?;
    seed(&sandbox, Some("rt-old"), -time::Duration::minutes(10))?;

    let out = sandbox.run(&["me"]).await?;
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("SESSION_EXPIRED_NEEDS_LOGIN"));
    assert_eq!(mock.token_calls(), 1);
    assert!(mock.requests().await.is_empty());
    Ok(())
}

// -- Authenticated commands ---------------------------------------------------

#[tokio::test]
async fn me_with_valid_session() -> anyhow::Result<()> {
    let mock = MockQuaily::start(vec![]).await?;
    let sandbox = Sandbox::with_base(&mock.base())?;
    seed(&sandbox, Some("rt"), time::Duration::hours(1))?;

    let out = sandbox.run(&["me", "--format", "json"]).await?;
    assert!(out.status.success(), "{}", stderr(&out));
    let me: Value = serde_json::from_str(&stdout(&out))?;
    assert_eq!(me["id"], 42);
    assert_eq!(mock.token_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn expired_session_refreshes_once() -> anyhow::Result<()> {
    let mock = MockQuaily::start(vec![(200, token_body("rotated-access", None, 3600))]).await?;
    let sandbox = Sandbox::with_base(&mock.base())?;
    let store = seed(&sandbox, Some("rt-keep"), -time::Duration::minutes(10))?;

    let out = sandbox.run(&["lists"]).await?;
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("field-notes"));
    assert_eq!(mock.token_calls(), 1);

    let session = store.load()?.ok_or_else(|| anyhow::anyhow!("session gone"))?;
    assert_eq!(session.access_token, "rotated-access");
    assert_eq!(session.refresh_token.as_deref(), Some("rt-keep"));
    assert!(!session.is_expired());

    let reqs = mock.requests().await;
    assert_eq!(reqs[0].authorization.as_deref(), Some("Bearer rotated-access"));
    Ok(())
}

// -- MCP ----------------------------------------------------------------------

#[tokio::test]
async fn mcp_stdio_session() -> anyhow::Result<()> {
    let mock = MockQuaily::start(vec![]).await?;
    let sandbox = Sandbox::with_base(&mock.base())?;
    seed(&sandbox, Some("rt"), time::Duration::hours(1))?;
    let mut mcp = sandbox.mcp_stdio()?;

    let init = mcp.request(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await?;
    assert_eq!(init["result"]["serverInfo"]["name"], "quail");
    mcp.notify(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await?;

    let call = mcp
        .request(&json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "quaily_search", "arguments": {"q": "rust"}},
        }))
        .await?;
    assert_eq!(call["id"], 2);
    assert!(call["result"]["content"][0]["text"].as_str().is_some_and(|t| t.contains("search-hit")));
    Ok(())
}

#[tokio::test]
async fn mcp_http_session() -> anyhow::Result<()> {
    let sandbox = Sandbox::new()?;
    let mcp = sandbox.mcp_http()?;
    mcp.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp = client
        .post(mcp.url())
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["result"]["tools"].as_array().map(Vec::len), Some(11));
    Ok(())
}
