// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a mock Quaily server, a simulated browser,
//! and assertion helpers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::credential::exchange::TokenSet;
use crate::credential::flow::BrowserLauncher;
use crate::credential::store::CredentialStore;
use crate::credential::guard::Interaction;
use crate::credential::Identity;
use crate::state::AppState;

/// Assert that an expression is `Err` and its message contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Map any displayable error into `anyhow` (for error types that are not
/// `std::error::Error + Send + Sync`).
pub trait AnyhowExt<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::fmt::Display> AnyhowExt<T> for Result<T, E> {
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{e}"))
    }
}

/// The identity served by [`MockQuaily`] for `GET /users/me`.
pub fn ann() -> Identity {
    Identity { id: 42, name: "Ann Author".into(), bio: "writes things".into() }
}

/// JSON body of a successful token response.
pub fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> String {
    let mut body = json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": expires_in,
    });
    if let Some(rt) = refresh {
        body["refresh_token"] = json!(rt);
    }
    body.to_string()
}

/// Token material expiring `offset` from now.
pub fn tokens_expiring_in(access: &str, refresh: Option<&str>, offset: time::Duration) -> TokenSet {
    TokenSet {
        access_token: access.into(),
        refresh_token: refresh.map(Into::into),
        token_type: "Bearer".into(),
        expiry: OffsetDateTime::now_utc() + offset,
    }
}

/// A store inside a fresh temp dir, optionally seeded with a session.
pub fn temp_store(
    seed: Option<(&TokenSet, Option<&Identity>)>,
) -> anyhow::Result<(tempfile::TempDir, CredentialStore)> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path().join("quail-cli/config.json"));
    if let Some((tokens, identity)) = seed {
        store.save_login(tokens)?;
        if let Some(identity) = identity {
            store.save_identity(identity)?;
        }
    }
    Ok((dir, store))
}

/// Settings pointing at `mock` with the store at `store_path`.
pub fn settings_for(mock: &MockQuaily, store_path: PathBuf) -> anyhow::Result<Settings> {
    Settings::test(&mock.base(), store_path)
}

/// Non-interactive state against a fresh mock, logged in as [`ann`] with a
/// session valid for an hour. The browser never comes back.
pub async fn logged_in() -> anyhow::Result<(MockQuaily, tempfile::TempDir, AppState)> {
    let mock = MockQuaily::start(vec![]).await?;
    let tokens = tokens_expiring_in("valid-access", Some("rt-1"), time::Duration::hours(1));
    let (dir, store) = temp_store(Some((&tokens, Some(&ann()))))?;
    let settings = settings_for(&mock, store.path().to_path_buf())?;
    let state = AppState::new(
        settings,
        SimulatedBrowser::new(BrowserAction::Ignore),
        Interaction::NonInteractive,
        tokio_util::sync::CancellationToken::new(),
    );
    Ok((mock, dir, state))
}

// ---------------------------------------------------------------------------
// Mock Quaily server
// ---------------------------------------------------------------------------

/// A request seen by the mock's resource endpoints.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct MockState {
    token_responses: Vec<(u16, String)>,
    token_calls: Arc<AtomicU32>,
    token_forms: Mutex<Vec<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
    me_status: AtomicU16,
}

/// In-process stand-in for both the Quaily API and its token endpoint.
///
/// `POST /oauth/token` replays `token_responses` in order (repeating the last
/// one); every other path is a canned resource endpoint that requires a
/// bearer token and records the request.
pub struct MockQuaily {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockQuaily {
    pub async fn start(token_responses: Vec<(u16, String)>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            token_responses,
            token_calls: Arc::new(AtomicU32::new(0)),
            token_forms: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            me_status: AtomicU16::new(200),
        });

        let token_state = Arc::clone(&state);
        let api_state = Arc::clone(&state);
        let app = Router::new()
            .route(
                "/oauth/token",
                post(move |body: String| {
                    let s = Arc::clone(&token_state);
                    async move { s.token(body).await }
                }),
            )
            .fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: String| {
                let s = Arc::clone(&api_state);
                async move { s.resource(method, uri, headers, body).await }
            });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, state })
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of token endpoint calls so far.
    pub fn token_calls(&self) -> u32 {
        self.state.token_calls.load(Ordering::Relaxed)
    }

    /// Decoded form bodies posted to the token endpoint.
    pub async fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.token_forms.lock().await.iter().map(|b| parse_form(b)).collect()
    }

    /// Resource requests so far, token endpoint excluded.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Make `GET /users/me` answer with `status`.
    pub fn set_me_status(&self, status: u16) {
        self.state.me_status.store(status, Ordering::Relaxed);
    }
}

impl MockState {
    async fn token(&self, body: String) -> (StatusCode, String) {
        let idx = self.token_calls.fetch_add(1, Ordering::Relaxed) as usize;
        self.token_forms.lock().await.push(body);
        let (status, body) = match self.token_responses.get(idx) {
            Some(r) => r.clone(),
            // Default: repeat last response.
            None => self.token_responses.last().cloned().unwrap_or((500, "{}".to_owned())),
        };
        (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
    }

    async fn resource(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let authorization = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.requests.lock().await.push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_owned(),
            query: uri.query().unwrap_or_default().to_owned(),
            authorization: authorization.clone(),
            body: body.clone(),
        });

        if !authorization.as_deref().is_some_and(|a| a.starts_with("Bearer ")) {
            return (StatusCode::UNAUTHORIZED, json!({"code": 401, "msg": "unauthorized"}).to_string());
        }

        let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
        let data = match (method.as_str(), segments.as_slice()) {
            ("GET", ["users", "me"]) => {
                let status = self.me_status.load(Ordering::Relaxed);
                if status != 200 {
                    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    return (code, json!({"code": status, "msg": "profile unavailable"}).to_string());
                }
                json!({"id": 42, "name": "Ann Author", "email": "ann@example.com", "bio": "writes things"})
            }
            ("GET", ["users", id, "lists"]) => json!([
                {"id": 7, "slug": "field-notes", "title": "Field Notes", "description": "Notes", "tagline": "from the field", "owner": id},
            ]),
            ("GET", ["lists", id]) => json!({"id": 7, "slug": "field-notes", "title": "Field Notes", "requested": id}),
            ("GET", ["lists", _, "posts"]) => json!({
                "pagination": {"current": 1, "offset": 0, "limit": 20, "next_offset": 0, "total": 1},
                "langs": [],
                "items": [sample_post("hello-world")],
            }),
            ("GET", ["lists", _, "posts", p]) => sample_post(p),
            ("GET", ["lists", _, "posts", p, "content"]) => {
                let mut post = sample_post(p);
                post["content"] = json!("# Hello\n\nBody text.");
                post
            }
            ("POST", ["lists", _, "posts"]) => {
                let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                let slug = payload.get("slug").and_then(Value::as_str).filter(|s| !s.is_empty()).unwrap_or("generated-slug");
                let mut post = sample_post(slug);
                post["title"] = payload.get("title").cloned().unwrap_or(Value::Null);
                post
            }
            ("DELETE", ["lists", _, "posts", p]) => sample_post(p),
            ("PUT", ["lists", _, "posts", p, op]) => {
                let mut post = sample_post(p);
                post["op"] = json!(op);
                post
            }
            ("POST", ["posts", "search"]) => json!({
                "pagination": {"current": 1, "offset": 0, "limit": 10, "next_offset": 0, "total": 1},
                "langs": ["en"],
                "items": [sample_post("search-hit")],
            }),
            ("POST", ["auxilia", "composer", "metadata"]) => json!({
                "slug": "generated-slug",
                "summary": "A generated summary.",
                "tags": "rust,cli",
            }),
            _ => return (StatusCode::NOT_FOUND, json!({"code": 404, "msg": "not found"}).to_string()),
        };
        (StatusCode::OK, json!({ "data": data }).to_string())
    }
}

fn sample_post(slug: &str) -> Value {
    json!({
        "id": 101,
        "slug": slug,
        "title": "Hello World",
        "summary": "A first post.",
        "content": "",
        "list_id": 7,
        "user_id": 42,
        "tags": "intro",
        "published_at": "2026-01-02T03:04:05Z",
        "list": {"id": 7, "slug": "field-notes", "title": "Field Notes"},
    })
}

fn parse_form(body: &str) -> HashMap<String, String> {
    match reqwest::Url::parse(&format!("http://form.invalid/?{body}")) {
        Ok(url) => url.query_pairs().into_owned().collect(),
        Err(_) => HashMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Simulated browser
// ---------------------------------------------------------------------------

/// What the simulated user does with the authorization page.
#[derive(Debug, Clone)]
pub enum BrowserAction {
    /// Approve and redirect back with this code.
    Approve(String),
    /// Deny consent.
    Deny,
    /// Redirect back with a state from some other flow.
    WrongState,
    /// Redirect back with the right state but no code.
    Malformed,
    /// Never come back.
    Ignore,
    /// Fail to launch at all (no browser available).
    Unavailable,
}

/// Stands in for the user's browser plus the authorization server's
/// consent page: parses the authorization URL and hits the redirect URI.
pub struct SimulatedBrowser {
    action: BrowserAction,
    pub launches: Arc<AtomicU32>,
    urls: Arc<std::sync::Mutex<Vec<String>>>,
}

impl SimulatedBrowser {
    pub fn new(action: BrowserAction) -> Arc<Self> {
        Arc::new(Self {
            action,
            launches: Arc::new(AtomicU32::new(0)),
            urls: Arc::new(std::sync::Mutex::new(Vec::new())),
        })
    }

    /// Authorization URLs this browser was asked to open.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl BrowserLauncher for SimulatedBrowser {
    fn launch(&self, url: &str) -> anyhow::Result<()> {
        self.launches.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_owned());
        }
        if matches!(self.action, BrowserAction::Unavailable) {
            anyhow::bail!("no browser available");
        }

        let parsed = reqwest::Url::parse(url)?;
        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        let redirect = params
            .get("redirect_uri")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("authorization URL has no redirect_uri"))?;
        let state = params.get("state").cloned().unwrap_or_default();

        let query = match &self.action {
            BrowserAction::Approve(code) => format!("code={code}&state={state}"),
            BrowserAction::Deny => format!("error=access_denied&state={state}"),
            BrowserAction::WrongState => "code=stolen&state=not-this-flow".to_owned(),
            BrowserAction::Malformed => format!("state={state}"),
            BrowserAction::Ignore | BrowserAction::Unavailable => return Ok(()),
        };
        let client = crate::http_client()?;
        tokio::spawn(async move {
            let _ = client.get(format!("{redirect}?{query}")).send().await;
        });
        Ok(())
    }
}
