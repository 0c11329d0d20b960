// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human and JSON renderings of command results.

use std::fmt::Write as _;

use serde::Serialize;

use crate::client::{List, Post, PostPage, User};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("invalid format: {other} (expected human or json)"),
        }
    }
}

/// Render `value` as pretty JSON, or with `human` for the human format.
pub fn render<T: Serialize>(
    format: Format,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(value)?),
        Format::Human => Ok(human(value)),
    }
}

pub fn user(u: &User) -> String {
    let mut out = format!("{} (id {})", u.name, u.id);
    if !u.email.is_empty() {
        let _ = write!(out, " <{}>", u.email);
    }
    if !u.bio.is_empty() {
        let _ = write!(out, "\n{}", u.bio);
    }
    out
}

pub fn lists(lists: &[List]) -> String {
    if lists.is_empty() {
        return "No channels.".to_owned();
    }
    let mut out = format!("{:<8} {:<24} {}", "ID", "SLUG", "TITLE");
    for l in lists {
        let _ = write!(out, "\n{:<8} {:<24} {}", l.id, l.slug, l.title);
    }
    out
}

pub fn post(p: &Post) -> String {
    let mut out = format!("{} [{}] (id {})", p.title, p.slug, p.id);
    if let Some(ref at) = p.published_at {
        let _ = write!(out, "\npublished: {at}");
    }
    if !p.tags.is_empty() {
        let _ = write!(out, "\ntags: {}", p.tags);
    }
    if !p.summary.is_empty() {
        let _ = write!(out, "\n\n{}", p.summary);
    }
    out
}

/// A post's body, with paid content appended when present.
pub fn post_content(p: &Post) -> String {
    let mut out = format!("# {}\n\n{}", p.title, p.content);
    if !p.paid_content.is_empty() {
        let _ = write!(out, "\n\n{}", p.paid_content);
    }
    out
}

pub fn post_page(page: &PostPage) -> String {
    if page.items.is_empty() {
        return "No posts.".to_owned();
    }
    let mut out = format!("{:<8} {:<32} {}", "ID", "SLUG", "TITLE");
    for p in &page.items {
        let _ = write!(out, "\n{:<8} {:<32} {}", p.id, p.slug, p.title);
    }
    let pg = &page.pagination;
    if pg.total > 0 {
        let _ = write!(out, "\n\n{} of {} (offset {})", page.items.len(), pg.total, pg.offset);
    }
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
