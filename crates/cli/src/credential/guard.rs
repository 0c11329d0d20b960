// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate in front of every authenticated call: hands out an access token
//! that is not expired, refreshing or logging in first when needed.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::config::Settings;
use crate::credential::exchange::TokenExchanger;
use crate::credential::flow::{AuthorizationFlow, BrowserLauncher};
use crate::credential::store::CredentialStore;
use crate::credential::{profile, AccessToken, Identity, Session};
use crate::error::AuthError;

/// Whether the caller can put a browser login in front of the user when a
/// stored session can no longer be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// A terminal user is present; an unrecoverable session falls through
    /// to a fresh browser login.
    Interactive,
    /// Agent tool calls and scripted runs; an unrecoverable session fails
    /// with [`AuthError::SessionExpiredNeedsLogin`].
    NonInteractive,
}

/// Result of a completed browser login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: AccessToken,
    pub identity: Option<Identity>,
    pub auth_url: String,
    pub store_path: PathBuf,
}

pub struct SessionGuard {
    store: CredentialStore,
    exchanger: TokenExchanger,
    flow: AuthorizationFlow,
    api: ApiClient,
    /// Held from the expired-session check through the refresh and any
    /// fallback login, so concurrent callers spend a refresh token once.
    refreshing: Mutex<()>,
}

impl SessionGuard {
    pub fn new(settings: &Settings, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            store: CredentialStore::new(&settings.store_path),
            exchanger: TokenExchanger::new(settings),
            flow: AuthorizationFlow::new(settings, browser),
            api: ApiClient::new(settings),
            refreshing: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a usable access token.
    ///
    /// 1. No stored session: run the browser login.
    /// 2. Session still valid: return it without touching the network.
    /// 3. Session expired: exactly one refresh, persisted before returning.
    ///    Concurrent callers wait for it and reuse the stored result.
    /// 4. Refresh impossible or rejected: fail with
    ///    [`AuthError::SessionExpiredNeedsLogin`], or log in again when
    ///    `mode` is [`Interaction::Interactive`].
    pub async fn access_token(
        &self,
        mode: Interaction,
        cancel: &CancellationToken,
    ) -> Result<AccessToken, AuthError> {
        let Some(session) = self.store.load()? else {
            info!("no stored session, starting login");
            return Ok(self.login(cancel).await?.token);
        };

        if !session.is_expired() {
            return Ok(AccessToken::from(&session));
        }

        let _refreshing = self.refreshing.lock().await;
        // Another caller may have refreshed (or logged out) while we waited.
        let Some(session) = self.store.load()? else {
            info!("session cleared while waiting, starting login");
            return Ok(self.login(cancel).await?.token);
        };
        if !session.is_expired() {
            debug!("session refreshed by a concurrent caller");
            return Ok(AccessToken::from(&session));
        }

        info!(expiry = %session.expiry, "access token expired, refreshing");
        let err = match self.refresh(&session).await {
            Ok(token) => return Ok(token),
            Err(err) => err,
        };
        match (mode, err) {
            (_, err @ AuthError::CredentialStoreUnavailable { .. }) => Err(err),
            (Interaction::NonInteractive, err @ AuthError::SessionExpiredNeedsLogin { .. }) => {
                Err(err)
            }
            (Interaction::NonInteractive, err) => {
                Err(AuthError::SessionExpiredNeedsLogin { reason: err.to_string() })
            }
            (Interaction::Interactive, err) => {
                warn!(err = %err, "refresh failed, starting login");
                Ok(self.login(cancel).await?.token)
            }
        }
    }

    /// Run the browser login unconditionally and persist the new session.
    pub async fn login(&self, cancel: &CancellationToken) -> Result<LoginOutcome, AuthError> {
        let grant = self.flow.run(cancel).await?;
        let tokens = self.exchanger.exchange_code(&grant).await?;
        self.store.save_login(&tokens)?;

        let mut token = AccessToken {
            token: tokens.access_token,
            token_type: tokens.token_type,
            user: None,
        };
        let identity = profile::bootstrap(&self.store, &self.api, &token).await?;
        token.user = identity.clone();
        info!(path = %self.store.path().display(), "login complete");

        Ok(LoginOutcome {
            token,
            identity,
            auth_url: grant.auth_url,
            store_path: self.store.path().to_path_buf(),
        })
    }

    async fn refresh(&self, session: &Session) -> Result<AccessToken, AuthError> {
        let Some(ref refresh_token) = session.refresh_token else {
            return Err(AuthError::SessionExpiredNeedsLogin {
                reason: "no refresh token stored".into(),
            });
        };
        let tokens = self.exchanger.refresh(refresh_token).await?;
        self.store.save_refresh(&tokens)?;
        Ok(AccessToken {
            token: tokens.access_token,
            token_type: tokens.token_type,
            user: session.user.clone(),
        })
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
