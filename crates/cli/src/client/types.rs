// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the Quaily API.

use serde::{Deserialize, Serialize};

/// Every API response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// The authenticated user (`GET /users/me`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_image_url: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub created_at: String,
}

/// A channel ("list" in API paths).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tagline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub paid_content: String,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub list_id: u64,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub first_published_at: Option<String>,
    #[serde(default)]
    pub list: Option<List>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub next_offset: u64,
    #[serde(default)]
    pub total: u64,
}

/// A page of posts (search results, channel listings).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub langs: Vec<String>,
    #[serde(default)]
    pub items: Vec<Post>,
}

/// Body of `POST /lists/{list}/posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover_image_url: String,
    /// RFC 3339.
    pub datetime: String,
    pub first_published_at: String,
    pub tags: String,
    /// Slug of the channel the post is saved to.
    pub channel: String,
}

/// State transitions applied with `PUT /lists/{list}/posts/{post}/{op}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    Publish,
    Unpublish,
    Deliver,
}

impl PostOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Deliver => "deliver",
        }
    }
}
