// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use reqwest::{Method, Url};
use serde_json::json;

use super::{ApiClient, NewPost, Post, PostOp, PostPage};
use crate::credential::AccessToken;

impl ApiClient {
    /// Endpoint for one post, plus any trailing segments. Lists and posts
    /// are addressed by ID or slug.
    fn post_endpoint(&self, list: &str, post: &str, rest: &[&str]) -> anyhow::Result<Url> {
        let mut segments = vec!["lists", list, "posts", post];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    pub async fn get_post(&self, token: &AccessToken, list: &str, post: &str) -> anyhow::Result<Post> {
        self.send(token, Method::GET, self.post_endpoint(list, post, &[])?, None).await
    }

    /// Post including its (paid) content, when the caller may read it.
    pub async fn get_post_content(
        &self,
        token: &AccessToken,
        list: &str,
        post: &str,
    ) -> anyhow::Result<Post> {
        self.send(token, Method::GET, self.post_endpoint(list, post, &["content"])?, None).await
    }

    /// Create or update a post in a channel (upserts by slug).
    pub async fn create_post(
        &self,
        token: &AccessToken,
        list: &str,
        payload: &NewPost,
    ) -> anyhow::Result<Post> {
        let body = serde_json::to_value(payload)?;
        let url = self.endpoint(&["lists", list, "posts"])?;
        self.send(token, Method::POST, url, Some(&body)).await
    }

    pub async fn delete_post(&self, token: &AccessToken, list: &str, post: &str) -> anyhow::Result<Post> {
        self.send(token, Method::DELETE, self.post_endpoint(list, post, &[])?, None).await
    }

    /// Apply a state transition (`publish`, `unpublish`, `deliver`).
    pub async fn mod_post(
        &self,
        token: &AccessToken,
        list: &str,
        post: &str,
        op: PostOp,
    ) -> anyhow::Result<Post> {
        let url = self.post_endpoint(list, post, &[op.as_str()])?;
        self.send(token, Method::PUT, url, None).await
    }

    pub async fn publish_post(&self, token: &AccessToken, list: &str, post: &str) -> anyhow::Result<Post> {
        self.mod_post(token, list, post, PostOp::Publish).await
    }

    pub async fn unpublish_post(&self, token: &AccessToken, list: &str, post: &str) -> anyhow::Result<Post> {
        self.mod_post(token, list, post, PostOp::Unpublish).await
    }

    /// Email the post to channel subscribers.
    pub async fn deliver_post(&self, token: &AccessToken, list: &str, post: &str) -> anyhow::Result<Post> {
        self.mod_post(token, list, post, PostOp::Deliver).await
    }

    /// Full-text search across Quaily.
    pub async fn search(&self, token: &AccessToken, query: &str) -> anyhow::Result<PostPage> {
        let body = json!({ "q": query });
        self.send(token, Method::POST, self.endpoint(&["posts", "search"])?, Some(&body)).await
    }
}
