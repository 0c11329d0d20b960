// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quail login`, `quail logout` and `quail status`.

use std::fmt::Write as _;

use serde::Serialize;

use crate::credential::Identity;
use crate::datetime;
use crate::output;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginReport {
    pub user: Option<Identity>,
    pub store: String,
    pub auth_url: String,
}

/// Summary of the saved session. Built from the store alone.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub logged_in: bool,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    pub expired: bool,
    pub refreshable: bool,
}

/// Force the browser flow, even over a valid session.
pub async fn login(state: &AppState) -> anyhow::Result<String> {
    let outcome = state.guard.login(&state.shutdown).await?;
    let report = LoginReport {
        user: outcome.identity,
        store: outcome.store_path.display().to_string(),
        auth_url: outcome.auth_url,
    };
    output::render(state.settings.format, &report, |r| {
        let who = match r.user {
            Some(ref u) => format!("Logged in as {} (id {}).", u.name, u.id),
            None => "Logged in.".to_owned(),
        };
        format!("{who}\nSession saved to {}", r.store)
    })
}

pub fn logout(state: &AppState) -> anyhow::Result<String> {
    let store = state.guard.store();
    let removed = store.clear()?;
    let value = serde_json::json!({ "logged_out": removed, "store": store.path().display().to_string() });
    output::render(state.settings.format, &value, |_| {
        if removed { "Logged out.".to_owned() } else { "No session stored.".to_owned() }
    })
}

pub fn status(state: &AppState) -> anyhow::Result<String> {
    let store = state.guard.store();
    let report = match store.load()? {
        Some(session) => StatusReport {
            logged_in: true,
            store: store.path().display().to_string(),
            expired: session.is_expired(),
            refreshable: session.refresh_token.is_some(),
            expiry: Some(datetime::rfc3339(session.expiry)),
            user: session.user,
        },
        None => StatusReport {
            logged_in: false,
            store: store.path().display().to_string(),
            user: None,
            expiry: None,
            expired: false,
            refreshable: false,
        },
    };
    output::render(state.settings.format, &report, status_human)
}

fn status_human(r: &StatusReport) -> String {
    if !r.logged_in {
        return format!("Not logged in (store: {}).", r.store);
    }
    let mut out = match r.user {
        Some(ref u) => format!("Logged in as {} (id {}).", u.name, u.id),
        None => "Logged in.".to_owned(),
    };
    let _ = write!(out, "\nstore: {}", r.store);
    if let Some(ref expiry) = r.expiry {
        let _ = write!(out, "\nexpires: {expiry}");
    }
    if r.expired {
        let next = if r.refreshable { "refreshes on next use" } else { "run `quail login`" };
        let _ = write!(out, " (expired, {next})");
    }
    out
}
