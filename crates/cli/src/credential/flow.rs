// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser-based authorization: bind a loopback callback, send the user to
//! the consent page, wait for the redirect carrying the grant.

use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::credential::callback::{CallbackOutcome, CallbackServer, WaitResult};
use crate::credential::pkce;
use crate::error::AuthError;

/// Authorization grant obtained from one flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub code: String,
    /// Redirect URI the grant was issued against; the token endpoint checks it.
    pub redirect_uri: String,
    pub code_verifier: String,
    /// The URL the user was sent to.
    pub auth_url: String,
}

/// Surfaces the authorization URL to the user.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self, url: &str) -> anyhow::Result<()>;
}

/// Opens the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> anyhow::Result<()> {
        let mut cmd = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        // Detached from our stdio: stdout may be carrying the MCP protocol.
        cmd.arg(url).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
        Ok(())
    }
}

/// Leaves opening the URL to the user (`--no-browser`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn launch(&self, _url: &str) -> anyhow::Result<()> {
        anyhow::bail!("browser launch disabled")
    }
}

/// Pick the launcher the settings ask for.
pub fn browser_for(settings: &Settings) -> Arc<dyn BrowserLauncher> {
    if settings.open_browser {
        Arc::new(SystemBrowser)
    } else {
        Arc::new(NoBrowser)
    }
}

/// Runs the authorization-code + PKCE round trip. At most one run is active
/// per instance; the session guard owns the single instance of a process.
pub struct AuthorizationFlow {
    authorize_url: String,
    client_id: String,
    scope: String,
    callback_port: u16,
    timeout: Duration,
    browser: Arc<dyn BrowserLauncher>,
    active: tokio::sync::Mutex<()>,
}

impl AuthorizationFlow {
    pub fn new(settings: &Settings, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            authorize_url: format!("{}/oauth/authorize", settings.auth_base),
            client_id: settings.client_id.clone(),
            scope: settings.scope.clone(),
            callback_port: settings.callback_port,
            timeout: settings.login_timeout,
            browser,
            active: tokio::sync::Mutex::new(()),
        }
    }

    /// Obtain a grant. Fails with [`AuthError::AuthorizationFailed`] on
    /// timeout, cancellation, denial, or a malformed callback; the error
    /// carries the authorization URL whenever one was built.
    ///
    /// The loopback listener is released before this returns, on every path.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Grant, AuthError> {
        let Ok(_active) = self.active.try_lock() else {
            return Err(AuthError::authorization("another login is already in progress", ""));
        };

        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let challenge = pkce::compute_code_challenge(&code_verifier);

        let mut server = CallbackServer::bind(self.callback_port, state.clone())
            .await
            .map_err(|e| {
                AuthError::authorization(format!("cannot bind callback listener: {e}"), "")
            })?;
        let redirect_uri = server.redirect_uri().to_owned();
        let auth_url = pkce::build_auth_url(
            &self.authorize_url,
            &self.client_id,
            &redirect_uri,
            &self.scope,
            &state,
            &challenge,
        )
        .map_err(|e| AuthError::authorization(format!("invalid authorize URL: {e}"), ""))?;

        eprintln!("Open this URL to log in to Quaily:");
        eprintln!("  {auth_url}");
        if let Err(e) = self.browser.launch(&auth_url) {
            warn!(err = %e, "could not open a browser; open the URL manually");
        }
        info!(redirect_uri = %redirect_uri, timeout_secs = self.timeout.as_secs(), "waiting for authorization callback");

        let waited = server.wait(self.timeout, cancel).await;
        server.close().await;

        match waited {
            WaitResult::Received(CallbackOutcome::Code(code)) => {
                info!("authorization grant received");
                Ok(Grant { code, redirect_uri, code_verifier, auth_url })
            }
            WaitResult::Received(CallbackOutcome::Denied { error, description }) => {
                let reason = match description {
                    Some(d) if !d.is_empty() => format!("{error}: {d}"),
                    _ => error,
                };
                Err(AuthError::authorization(format!("authorization denied ({reason})"), auth_url))
            }
            WaitResult::Received(CallbackOutcome::Malformed(reason)) => {
                Err(AuthError::authorization(reason, auth_url))
            }
            WaitResult::TimedOut => Err(AuthError::authorization(
                format!("no callback within {}s", self.timeout.as_secs()),
                auth_url,
            )),
            WaitResult::Cancelled => Err(AuthError::authorization("login cancelled", auth_url)),
        }
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
