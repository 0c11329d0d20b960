// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-authenticated JSON client for the Quaily API.
//!
//! The client never decides whether a token is fresh; callers obtain one
//! from the session guard and pass it to every call.

mod composer;
mod list;
mod post;
pub mod types;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::credential::AccessToken;
pub use types::{List, NewPost, Pagination, Post, PostOp, PostPage, User};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Self {
        Self { http: settings.http.clone(), api_base: settings.api_base.clone() }
    }

    /// `GET /users/me`.
    pub async fn get_me(&self, token: &AccessToken) -> anyhow::Result<User> {
        self.send(token, Method::GET, self.endpoint(&["users", "me"])?, None).await
    }

    /// `{api_base}` joined with `segments`, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("API base {} cannot take a path", self.api_base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and unwrap the `data` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> anyhow::Result<T> {
        let path = url.path().to_owned();
        debug!(%method, path, "api request");

        let mut req = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::AUTHORIZATION, token.authorization());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("{method} {path} failed ({status}): {}", error_message(&text));
        }
        let envelope: types::Envelope<T> = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("{method} {path}: unexpected response: {e}"))?;
        Ok(envelope.data)
    }
}

/// Pull the human-readable message out of an API error body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let msg = parsed.as_ref().and_then(|v| {
        ["msg", "message", "error"].iter().find_map(|k| v.get(*k).and_then(Value::as_str))
    });
    match msg {
        Some(m) => m.to_owned(),
        None => body.trim().to_owned(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
