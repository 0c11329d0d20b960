// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoint client: trades an authorization grant or a refresh token
//! for fresh token material. Never retries; the caller picks the fallback.

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::Settings;
use crate::credential::flow::Grant;
use crate::error::{AuthError, ExchangeStep};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Token material returned by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    /// Present only when the server issued (or rotated) a refresh token.
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expiry: OffsetDateTime,
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth error response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for `POST {api_base}/oauth/token`.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
}

impl TokenExchanger {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: settings.http.clone(),
            token_url: format!("{}/oauth/token", settings.api_base),
            client_id: settings.client_id.clone(),
        }
    }

    /// First issuance: exchange an authorization grant.
    pub async fn exchange_code(&self, grant: &Grant) -> Result<TokenSet, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", grant.code.as_str()),
            ("redirect_uri", grant.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", grant.code_verifier.as_str()),
        ];
        let tokens = self.request(ExchangeStep::AuthorizationCode, &form).await?;
        info!(expiry = %tokens.expiry, "authorization code exchanged");
        Ok(tokens)
    }

    /// Rotation: exchange a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        let tokens = self.request(ExchangeStep::Refresh, &form).await?;
        info!(expiry = %tokens.expiry, rotated = tokens.refresh_token.is_some(), "access token refreshed");
        Ok(tokens)
    }

    async fn request(
        &self,
        step: ExchangeStep,
        form: &[(&str, &str)],
    ) -> Result<TokenSet, AuthError> {
        debug!(url = %self.token_url, grant_type = step.as_str(), "token request");
        let resp = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::exchange(step, format!("HTTP error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::exchange(step, format!("read body: {e}")))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
                let reason = match err.error_description {
                    Some(desc) if !desc.is_empty() => format!("HTTP {status}: {}: {desc}", err.error),
                    _ => format!("HTTP {status}: {}", err.error),
                };
                return Err(AuthError::exchange(step, reason));
            }
            return Err(AuthError::exchange(step, format!("HTTP {status}: {}", body.trim())));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::exchange(step, format!("parse response: {e}")))?;
        token_set(token, OffsetDateTime::now_utc()).map_err(|reason| AuthError::exchange(step, reason))
    }
}

fn token_set(token: TokenResponse, now: OffsetDateTime) -> Result<TokenSet, String> {
    if token.access_token.is_empty() {
        return Err("response has no access_token".to_owned());
    }
    // Lifetimes inside the expiry skew are kept as issued: the token is used
    // once and the next guard call refreshes it.
    let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS).max(0);
    let Some(expiry) = now.checked_add(time::Duration::seconds(lifetime)) else {
        return Err(format!("expires_in {lifetime} out of range"));
    };
    Ok(TokenSet {
        access_token: token.access_token,
        refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
        token_type: token.token_type.filter(|t| !t.is_empty()).unwrap_or_else(|| "Bearer".to_owned()),
        expiry,
    })
}

#[cfg(test)]
#[path = "exchange_tests.rs"]
mod tests;
