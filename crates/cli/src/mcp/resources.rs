// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP resources: the caller's channels.

use serde_json::{json, Value};

use crate::config::Settings;
use crate::state::AppState;

pub fn channels_uri(settings: &Settings) -> String {
    format!("{}/me/channels", settings.auth_base)
}

/// The `resources/list` catalogue.
pub fn list(settings: &Settings) -> Vec<Value> {
    vec![json!({
        "uri": channels_uri(settings),
        "name": "My Quaily Channels",
        "mimeType": "text/html",
    })]
}

/// Contents of a resource, one item per channel.
pub async fn read(state: &AppState, uri: &str) -> anyhow::Result<Vec<Value>> {
    if uri != channels_uri(&state.settings) {
        anyhow::bail!("unknown resource: {uri}");
    }
    let token = state.token().await?;
    let user_id = state.user_id(&token).await?;
    let lists = state.api.get_user_lists(&token, user_id).await?;
    Ok(lists
        .iter()
        .map(|l| {
            json!({
                "uri": state.settings.channel_url(&l.slug),
                "mimeType": "text/html",
                "text": format!("Title: {}, Description: {}, Tagline: {}", l.title, l.description, l.tagline),
            })
        })
        .collect())
}
