// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use time::macros::datetime;

use super::*;
use crate::test_support::{token_body, MockQuaily};

fn grant() -> Grant {
    Grant {
        code: "code-1".into(),
        redirect_uri: "http://127.0.0.1:1234/callback".into(),
        code_verifier: "verifier-1".into(),
        auth_url: "http://auth.invalid/oauth/authorize".into(),
    }
}

async fn exchanger(responses: Vec<(u16, String)>) -> anyhow::Result<(MockQuaily, TokenExchanger)> {
    let mock = MockQuaily::start(responses).await?;
    let settings = Settings::test(&mock.base(), PathBuf::from("/unused"))?;
    let ex = TokenExchanger::new(&settings);
    Ok((mock, ex))
}

#[tokio::test]
async fn code_exchange_posts_pkce_form() -> anyhow::Result<()> {
    let (mock, ex) = exchanger(vec![(200, token_body("at-1", Some("rt-1"), 3600))]).await?;
    let before = OffsetDateTime::now_utc();
    let tokens = ex.exchange_code(&grant()).await?;

    assert_eq!(tokens.access_token, "at-1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(tokens.token_type, "bearer");
    assert!(tokens.expiry >= before + time::Duration::seconds(3600));

    let forms = mock.token_forms().await;
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
    assert_eq!(form.get("code").map(String::as_str), Some("code-1"));
    assert_eq!(form.get("code_verifier").map(String::as_str), Some("verifier-1"));
    assert_eq!(form.get("redirect_uri").map(String::as_str), Some("http://127.0.0.1:1234/callback"));
    assert_eq!(form.get("client_id").map(String::as_str), Some("quail-cli-test"));
    Ok(())
}

#[tokio::test]
async fn refresh_posts_refresh_grant() -> anyhow::Result<()> {
    let (mock, ex) = exchanger(vec![(200, token_body("at-2", None, 60))]).await?;
    let tokens = ex.refresh("rt-1").await?;
    assert_eq!(tokens.access_token, "at-2");
    assert_eq!(tokens.refresh_token, None);

    let forms = mock.token_forms().await;
    assert_eq!(forms[0].get("grant_type").map(String::as_str), Some("refresh_token"));
    assert_eq!(forms[0].get("refresh_token").map(String::as_str), Some("rt-1"));
    Ok(())
}

#[tokio::test]
async fn oauth_error_is_exchange_failure_without_retry() -> anyhow::Result<()> {
    let body = r#"{"error":"invalid_grant","error_description":"refresh token revoked"}"#;
    let (mock, ex) = exchanger(vec![(400, body.to_owned())]).await?;
    match ex.refresh("rt-1").await {
        Err(AuthError::TokenExchangeFailed { step, reason }) => {
            assert_eq!(step, ExchangeStep::Refresh);
            assert!(reason.contains("invalid_grant: refresh token revoked"), "{reason}");
        }
        other => anyhow::bail!("expected TokenExchangeFailed, got {other:?}"),
    }
    assert_eq!(mock.token_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unusable_responses_are_exchange_failures() -> anyhow::Result<()> {
    let cases = [
        (502, "bad gateway", "HTTP 502"),
        (200, "<html>", "parse response"),
        (200, r#"{"access_token":""}"#, "no access_token"),
    ];
    for (status, body, expected) in cases {
        let (_mock, ex) = exchanger(vec![(status, body.to_owned())]).await?;
        crate::assert_err_contains!(ex.exchange_code(&grant()).await, expected);
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_exchange_failure() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let settings = Settings::test(&format!("http://{addr}"), PathBuf::from("/unused"))?;
    crate::assert_err_contains!(
        TokenExchanger::new(&settings).refresh("rt").await,
        "refresh_token exchange failed: HTTP error"
    );
    Ok(())
}

#[test]
fn missing_lifetime_and_type_get_defaults() -> anyhow::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let token: TokenResponse = serde_json::from_str(r#"{"access_token":"at","refresh_token":""}"#)?;
    let set = token_set(token, now).map_err(anyhow::Error::msg)?;
    assert_eq!(set.token_type, "Bearer");
    assert_eq!(set.refresh_token, None);
    assert_eq!(set.expiry, now + time::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));
    Ok(())
}

#[tokio::test]
async fn overflowing_lifetime_is_exchange_failure() -> anyhow::Result<()> {
    let body = r#"{"access_token":"a","expires_in":9223372036854775807}"#.to_owned();
    let (mock, ex) = exchanger(vec![(200, body)]).await?;
    match ex.refresh("rt").await {
        Err(AuthError::TokenExchangeFailed { reason, .. }) => {
            assert!(reason.contains("out of range"), "{reason}");
        }
        other => anyhow::bail!("expected TokenExchangeFailed, got {other:?}"),
    }
    assert_eq!(mock.token_calls(), 1);
    Ok(())
}

#[test]
fn short_lifetime_is_kept_as_issued() -> anyhow::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let token: TokenResponse = serde_json::from_str(r#"{"access_token":"at","expires_in":10}"#)?;
    let set = token_set(token, now).map_err(anyhow::Error::msg)?;
    assert_eq!(set.expiry, now + time::Duration::seconds(10));
    Ok(())
}
