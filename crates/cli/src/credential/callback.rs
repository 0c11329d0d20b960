// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot loopback listener that receives the authorization redirect.
//!
//! The listener lives only inside a single authorization flow: it is bound
//! by [`CallbackServer::bind`] and released by [`CallbackServer::close`]
//! (or on drop).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long [`CallbackServer::close`] waits for in-flight responses.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_HTML: &str = "<html><body><h1>Logged in to Quaily</h1>\
     <p>You may close this window and return to the terminal.</p></body></html>";
const FAILURE_HTML: &str = "<html><body><h1>Login failed</h1>\
     <p>You may close this window and retry <code>quail login</code>.</p></body></html>";
const MISMATCH_HTML: &str = "<html><body><h1>Unrecognized login attempt</h1>\
     <p>This callback does not belong to the login in progress.</p></body></html>";

/// Result delivered by the one callback that matched the flow's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The user approved; carries the authorization code.
    Code(String),
    /// The authorization server reported an error (typically `access_denied`).
    Denied { error: String, description: Option<String> },
    /// The state matched but the parameters were unusable.
    Malformed(String),
}

/// How a wait on the callback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    Received(CallbackOutcome),
    TimedOut,
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

struct CallbackState {
    expected_state: String,
    tx: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

/// A bound loopback listener serving `GET /callback`.
pub struct CallbackServer {
    addr: SocketAddr,
    redirect_uri: String,
    rx: oneshot::Receiver<CallbackOutcome>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:{port}` (0 picks a free port) and start serving.
    /// Only callbacks echoing `expected_state` are accepted.
    pub async fn bind(port: u16, expected_state: impl Into<String>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(CallbackState {
            expected_state: expected_state.into(),
            tx: Mutex::new(Some(tx)),
        });
        let app = Router::new().route("/callback", get(callback)).with_state(state);

        let shutdown = CancellationToken::new();
        let sd = shutdown.clone();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { sd.cancelled().await })
                .await;
            if let Err(e) = result {
                warn!(err = %e, "callback listener error");
            }
        });
        debug!(%addr, "callback listener bound");

        Ok(Self { addr, redirect_uri: format!("http://127.0.0.1:{}/callback", addr.port()), rx, shutdown, task: Some(task) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Block until a matching callback arrives, `timeout` elapses, or
    /// `cancel` fires.
    pub async fn wait(&mut self, timeout: Duration, cancel: &CancellationToken) -> WaitResult {
        tokio::select! {
            received = tokio::time::timeout(timeout, &mut self.rx) => match received {
                Ok(Ok(outcome)) => WaitResult::Received(outcome),
                // Sender gone without a value: the server stopped underneath us.
                Ok(Err(_)) => WaitResult::Cancelled,
                Err(_) => WaitResult::TimedOut,
            },
            _ = cancel.cancelled() => WaitResult::Cancelled,
        }
    }

    /// Stop serving and release the port. Returns once the listener is gone.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
                task.abort();
                let _ = task.await;
            }
        }
        debug!(addr = %self.addr, "callback listener closed");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn callback(
    State(s): State<Arc<CallbackState>>,
    Query(q): Query<CallbackQuery>,
) -> (StatusCode, Html<&'static str>) {
    if q.state.as_deref() != Some(s.expected_state.as_str()) {
        warn!(has_state = q.state.is_some(), "rejected callback with mismatched state");
        return (StatusCode::BAD_REQUEST, Html(MISMATCH_HTML));
    }

    let outcome = match (q.error, q.code) {
        (Some(error), _) => CallbackOutcome::Denied { error, description: q.error_description },
        (None, Some(code)) if !code.is_empty() => CallbackOutcome::Code(code),
        (None, _) => CallbackOutcome::Malformed("callback carried neither code nor error".into()),
    };
    let ok = matches!(outcome, CallbackOutcome::Code(_));

    let Some(tx) = s.tx.lock().await.take() else {
        return (StatusCode::CONFLICT, Html(FAILURE_HTML));
    };
    let _ = tx.send(outcome);

    if ok {
        (StatusCode::OK, Html(SUCCESS_HTML))
    } else {
        (StatusCode::BAD_REQUEST, Html(FAILURE_HTML))
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
