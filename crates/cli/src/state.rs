// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process state shared by the command-line and MCP entry points.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::config::Settings;
use crate::credential::flow::BrowserLauncher;
use crate::credential::guard::{Interaction, SessionGuard};
use crate::credential::AccessToken;
use crate::error::AuthError;

/// Everything an operation needs: settings, the one session guard of this
/// process, the API client, and the shutdown token.
pub struct AppState {
    pub settings: Settings,
    pub guard: SessionGuard,
    pub api: ApiClient,
    pub mode: Interaction,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        settings: Settings,
        browser: Arc<dyn BrowserLauncher>,
        mode: Interaction,
        shutdown: CancellationToken,
    ) -> Self {
        let guard = SessionGuard::new(&settings, browser);
        let api = ApiClient::new(&settings);
        Self { settings, guard, api, mode, shutdown }
    }

    /// A fresh access token through the session guard.
    pub async fn token(&self) -> Result<AccessToken, AuthError> {
        self.guard.access_token(self.mode, &self.shutdown).await
    }

    /// The caller's user ID, from the cached identity or, when the login
    /// could not record one, from the API.
    pub async fn user_id(&self, token: &AccessToken) -> anyhow::Result<u64> {
        if let Some(id) = token.user_id() {
            return Ok(id);
        }
        Ok(self.api.get_me(token).await?.id)
    }
}
