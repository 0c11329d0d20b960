// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use reqwest::Method;

use super::{ApiClient, List, PostPage};
use crate::credential::AccessToken;

impl ApiClient {
    /// Channels owned by a user.
    pub async fn get_user_lists(&self, token: &AccessToken, user_id: u64) -> anyhow::Result<Vec<List>> {
        let url = self.endpoint(&["users", &user_id.to_string(), "lists"])?;
        self.send(token, Method::GET, url, None).await
    }

    pub async fn get_list(&self, token: &AccessToken, list_id: u64) -> anyhow::Result<List> {
        let url = self.endpoint(&["lists", &list_id.to_string()])?;
        self.send(token, Method::GET, url, None).await
    }

    /// A page of a channel's posts.
    pub async fn get_list_posts(
        &self,
        token: &AccessToken,
        list_id: u64,
        offset: u64,
        limit: u64,
    ) -> anyhow::Result<PostPage> {
        if list_id == 0 {
            anyhow::bail!("list ID is required");
        }
        let mut url = self.endpoint(&["lists", &list_id.to_string(), "posts"])?;
        url.set_query(Some(&format!("offset={offset}&limit={limit}")));
        self.send(token, Method::GET, url, None).await
    }
}
