// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quail post ...`.

use crate::output;
use crate::state::AppState;

/// A post addressed by channel and post, each an ID or slug.
#[derive(Debug, Clone, clap::Args)]
pub struct PostRef {
    /// Channel ID or slug.
    pub list: String,
    /// Post ID or slug.
    pub post: String,
}

#[derive(Debug, clap::Subcommand)]
pub enum PostCommand {
    /// Show a post's metadata.
    Get(PostRef),
    /// Print a post's content as markdown.
    Content(PostRef),
    Publish(PostRef),
    Unpublish(PostRef),
    /// Email the post to subscribers.
    Deliver(PostRef),
    Delete(PostRef),
    /// Search posts across Quaily.
    Search {
        query: String,
    },
}

pub async fn run(state: &AppState, command: &PostCommand) -> anyhow::Result<String> {
    let token = state.token().await?;
    let api = &state.api;
    let format = state.settings.format;

    let post = match command {
        PostCommand::Search { query } => {
            let page = api.search(&token, query).await?;
            return output::render(format, &page, output::post_page);
        }
        PostCommand::Content(r) => {
            let post = api.get_post_content(&token, &r.list, &r.post).await?;
            return output::render(format, &post, output::post_content);
        }
        PostCommand::Get(r) => api.get_post(&token, &r.list, &r.post).await?,
        PostCommand::Publish(r) => api.publish_post(&token, &r.list, &r.post).await?,
        PostCommand::Unpublish(r) => api.unpublish_post(&token, &r.list, &r.post).await?,
        PostCommand::Deliver(r) => api.deliver_post(&token, &r.list, &r.post).await?,
        PostCommand::Delete(r) => api.delete_post(&token, &r.list, &r.post).await?,
    };
    output::render(format, &post, output::post)
}
