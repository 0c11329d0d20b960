// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use reqwest::Method;
use serde_json::{json, Value};

use super::ApiClient;
use crate::credential::AccessToken;

impl ApiClient {
    /// Ask the composer to suggest a slug, summary and tags for a draft.
    pub async fn generate_metadata(
        &self,
        token: &AccessToken,
        title: &str,
        content: &str,
    ) -> anyhow::Result<Value> {
        let body = json!({ "title": title, "content": content });
        let mut url = self.endpoint(&["auxilia", "composer", "metadata"])?;
        url.set_query(Some("includes=slug,summary,tags"));
        self.send(token, Method::POST, url, Some(&body)).await
    }
}
