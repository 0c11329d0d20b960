// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent tools exposed over MCP.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::NewPost;
use crate::config::parse_post_url;
use crate::credential::AccessToken;
use crate::state::AppState;
use crate::{datetime, frontmatter};

/// Result of a `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![TextContent { kind: "text", text: text.into() }], is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { is_error: true, ..Self::text(text) }
    }

    /// Concatenated text of all content items.
    pub fn joined(&self) -> String {
        self.content.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

const POST_FIELDS: &[(&str, &str)] = &[
    ("title", "Title of the post"),
    ("channel", "Channel slug to save the post to"),
    ("content", "Markdown content of the post, without frontmatter"),
    ("slug", "Slug of the post; lowercase letters, numbers and hyphens. Generated when empty"),
    ("summary", "Summary of the post"),
    ("datetime", "Publish datetime of the post; any common format, defaults to now"),
    ("tags", "Comma-separated tags of the post"),
];

fn string_props(fields: &[(&str, &str)]) -> serde_json::Map<String, Value> {
    fields
        .iter()
        .map(|(name, desc)| ((*name).to_owned(), json!({ "type": "string", "description": desc })))
        .collect()
}

fn tool(name: &str, description: &str, properties: serde_json::Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": { "type": "object", "properties": properties, "required": required },
    })
}

/// The `tools/list` catalogue.
pub fn definitions() -> Vec<Value> {
    let mut save_props = string_props(POST_FIELDS);
    save_props.insert(
        "cover_image_url".into(),
        json!({ "type": "string", "description": "Cover image URL of the post" }),
    );
    let number = |desc: &str| json!({ "type": "number", "description": desc });

    vec![
        tool(
            "quaily_login",
            "Log in to Quaily. If the browser does not open automatically, open auth_url manually.",
            serde_json::Map::new(),
            &[],
        ),
        tool(
            "get_my_channels",
            "Return my channels. Each item is a JSON object.",
            serde_json::Map::new(),
            &[],
        ),
        tool(
            "get_my_channel_posts",
            "Return the posts of a channel, given the channel id.",
            [
                ("channel_id".to_owned(), number("The id of the channel")),
                ("offset".to_owned(), number("Offset of the first post to return (default 0)")),
                ("limit".to_owned(), number("Maximum number of posts to return (default 20)")),
            ]
            .into_iter()
            .collect(),
            &["channel_id"],
        ),
        tool(
            "quaily_search",
            "Search Quaily for posts about a topic.",
            string_props(&[("q", "Query to search Quaily for")]),
            &["q"],
        ),
        tool(
            "get_quaily_url",
            "Return the public URL of a channel, or of a post when a post slug or id is given.",
            {
                let mut props = string_props(&[
                    ("channel_slug", "The slug of the channel"),
                    ("post_slug", "The slug of the post"),
                ]);
                props.insert("channel_id".into(), number("The id of the channel"));
                props.insert("post_id".into(), number("The id of the post"));
                props
            },
            &[],
        ),
        tool(
            "get_quaily_post_content",
            "Return a post given its channel and post slugs, or its URL. Paid content is included when the user may read it.",
            string_props(&[
                ("channel_slug", "The slug of the channel"),
                ("post_slug", "The slug of the post"),
                ("url", "The URL of the post"),
            ]),
            &[],
        ),
        tool(
            "quaily_save_post",
            "Save a post as a draft. Extract title, slug, summary, datetime and tags from the file's frontmatter; \
             pass the body without frontmatter as content. Write the returned slug and datetime back to the frontmatter.",
            save_props,
            &["title", "channel", "content"],
        ),
        tool(
            "quaily_publish_post",
            "Save a post and publish it. Arguments as for quaily_save_post. Returns the published post's metadata.",
            string_props(POST_FIELDS),
            &["title", "channel", "content"],
        ),
        tool(
            "quaily_unpublish_post",
            "Unpublish a post given its channel slug and post slug.",
            string_props(&[
                ("channel", "Slug of the channel"),
                ("slug", "Slug of the post"),
            ]),
            &["channel", "slug"],
        ),
        tool(
            "quaily_generate_metadata",
            "Generate a slug, summary and tags for a post from its title and content.",
            string_props(&[("title", "Title of the post"), ("content", "Content of the post")]),
            &["title", "content"],
        ),
        tool(
            "quaily_insert_frontmatter",
            "Return a frontmatter block to insert at the top of a new markdown post.",
            string_props(&[("title", "Title of the post")]),
            &["title"],
        ),
    ]
}

/// Run a tool. Returns `None` if `name` is not a known tool.
pub async fn call(state: &AppState, name: &str, args: &Value) -> Option<ToolResult> {
    let result = match name {
        "quaily_login" => return Some(login(state).await),
        "get_my_channels" => get_my_channels(state).await,
        "get_my_channel_posts" => get_my_channel_posts(state, args).await,
        "quaily_search" => search(state, args).await,
        "get_quaily_url" => get_url(state, args).await,
        "get_quaily_post_content" => get_post_content(state, args).await,
        "quaily_save_post" => save_post(state, args, false).await,
        "quaily_publish_post" => save_post(state, args, true).await,
        "quaily_unpublish_post" => unpublish_post(state, args).await,
        "quaily_generate_metadata" => generate_metadata(state, args).await,
        "quaily_insert_frontmatter" => insert_frontmatter(args),
        _ => return None,
    };
    Some(match result {
        Ok(text) => ToolResult::text(text),
        Err(e) => {
            warn!(tool = name, err = %format!("{e:#}"), "tool failed");
            ToolResult::error(format!("{e:#}"))
        }
    })
}

async fn login(state: &AppState) -> ToolResult {
    match state.guard.login(&state.shutdown).await {
        Ok(outcome) => {
            info!("login via agent tool complete");
            ToolResult::text(format!(
                "login successful. auth_url={}. If the browser did not open automatically, open auth_url manually.",
                outcome.auth_url
            ))
        }
        Err(e) => {
            let text = match e.auth_url() {
                Some(url) => format!(
                    "login failed: {e}. auth_url={url}. If the browser did not open automatically, open auth_url manually."
                ),
                None => format!("login failed: {e}"),
            };
            ToolResult::error(text)
        }
    }
}

async fn get_my_channels(state: &AppState) -> anyhow::Result<String> {
    let token = state.token().await?;
    let user_id = state.user_id(&token).await?;
    let lists = state.api.get_user_lists(&token, user_id).await?;
    let items = lists.iter().map(serde_json::to_string).collect::<Result<Vec<_>, _>>()?;
    Ok(items.join("\n\n"))
}

async fn get_my_channel_posts(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let channel_id = num_arg(args, "channel_id").ok_or_else(|| anyhow::anyhow!("channel_id is required"))?;
    let offset = num_arg(args, "offset").unwrap_or(0);
    let limit = num_arg(args, "limit").unwrap_or(20);
    let token = state.token().await?;
    let page = state.api.get_list_posts(&token, channel_id, offset, limit).await?;
    Ok(serde_json::to_string(&page)?)
}

async fn search(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let q = required(args, "q")?;
    let token = state.token().await?;
    let page = state.api.search(&token, &q).await?;
    Ok(serde_json::to_string(&page)?)
}

async fn get_url(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let mut channel_slug = str_arg(args, "channel_slug");
    let channel_id = num_arg(args, "channel_id").unwrap_or(0);
    let mut post_slug = str_arg(args, "post_slug");
    let post_id = num_arg(args, "post_id").unwrap_or(0);
    if channel_slug.is_empty() && channel_id == 0 {
        anyhow::bail!("no channel slug or channel id provided");
    }

    // Only resolving IDs to slugs needs the API.
    let mut token: Option<AccessToken> = None;
    if channel_slug.is_empty() {
        let t = state.token().await?;
        channel_slug = state.api.get_list(&t, channel_id).await?.slug;
        token = Some(t);
    }
    let settings = &state.settings;
    let url = if !post_slug.is_empty() || post_id != 0 {
        if post_slug.is_empty() {
            let t = match token {
                Some(t) => t,
                None => state.token().await?,
            };
            post_slug = state.api.get_post(&t, &channel_slug, &post_id.to_string()).await?.slug;
        }
        settings.post_url(&channel_slug, &post_slug)
    } else {
        settings.channel_url(&channel_slug)
    };
    Ok(json!({ "url": url }).to_string())
}

async fn get_post_content(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let mut channel_slug = str_arg(args, "channel_slug");
    let mut post_slug = str_arg(args, "post_slug");
    if channel_slug.is_empty() || post_slug.is_empty() {
        if let Some((c, p)) = parse_post_url(&str_arg(args, "url"))? {
            channel_slug = c;
            post_slug = p;
        }
    }
    if channel_slug.is_empty() || post_slug.is_empty() {
        anyhow::bail!("no channel slug or post slug or a valid URL provided");
    }
    let token = state.token().await?;
    let post = state.api.get_post_content(&token, &channel_slug, &post_slug).await?;
    Ok(serde_json::to_string(&post)?)
}

async fn save_post(state: &AppState, args: &Value, publish: bool) -> anyhow::Result<String> {
    let title = required(args, "title")?;
    let channel = required(args, "channel")?;
    let content = required(args, "content")?;
    let when = datetime::normalize(&str_arg(args, "datetime"));
    let mut cover_image_url = str_arg(args, "cover_image_url");
    if publish && cover_image_url.is_empty() {
        cover_image_url = format!("{}/images/default-cover.png", state.settings.auth_base);
    }
    let payload = NewPost {
        slug: str_arg(args, "slug"),
        title,
        summary: str_arg(args, "summary"),
        content,
        cover_image_url,
        datetime: when.clone(),
        first_published_at: when,
        tags: str_arg(args, "tags"),
        channel: channel.clone(),
    };

    let token = state.token().await?;
    let mut post = state.api.create_post(&token, &channel, &payload).await?;
    if publish {
        let key = if post.slug.is_empty() { post.id.to_string() } else { post.slug.clone() };
        post = state.api.publish_post(&token, &channel, &key).await?;
    }
    Ok(serde_json::to_string(&post)?)
}

async fn unpublish_post(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let channel = required(args, "channel")?;
    let slug = required(args, "slug")?;
    let token = state.token().await?;
    let post = state.api.unpublish_post(&token, &channel, &slug).await?;
    Ok(serde_json::to_string(&post)?)
}

async fn generate_metadata(state: &AppState, args: &Value) -> anyhow::Result<String> {
    let title = required(args, "title")?;
    let content = required(args, "content")?;
    let token = state.token().await?;
    let meta = state.api.generate_metadata(&token, &title, &content).await?;
    Ok(meta.to_string())
}

fn insert_frontmatter(args: &Value) -> anyhow::Result<String> {
    let title = required(args, "title")?;
    Ok(frontmatter::template(&title, datetime::now_local()))
}

// -- argument helpers ---------------------------------------------------------

fn str_arg(args: &Value, key: &str) -> String {
    args.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn required(args: &Value, key: &str) -> anyhow::Result<String> {
    let value = str_arg(args, key);
    if value.trim().is_empty() {
        anyhow::bail!("{key} is required");
    }
    Ok(value)
}

/// A non-negative integer argument, given as a JSON number or numeric string.
fn num_arg(args: &Value, key: &str) -> Option<u64> {
    match args.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
