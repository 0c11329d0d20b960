// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quail me` and `quail lists`.

use crate::output;
use crate::state::AppState;

#[derive(Debug, clap::Args)]
pub struct ListsArgs {
    #[command(subcommand)]
    pub command: Option<ListsCommand>,
}

#[derive(Debug, clap::Subcommand)]
pub enum ListsCommand {
    /// List the posts of one channel.
    Posts {
        /// Channel ID.
        list_id: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
}

pub async fn me(state: &AppState) -> anyhow::Result<String> {
    let token = state.token().await?;
    let user = state.api.get_me(&token).await?;
    output::render(state.settings.format, &user, output::user)
}

pub async fn lists(state: &AppState, args: &ListsArgs) -> anyhow::Result<String> {
    let token = state.token().await?;
    match args.command {
        None => {
            let user_id = state.user_id(&token).await?;
            let lists = state.api.get_user_lists(&token, user_id).await?;
            output::render(state.settings.format, &lists, |l| output::lists(l))
        }
        Some(ListsCommand::Posts { list_id, offset, limit }) => {
            let page = state.api.get_list_posts(&token, list_id, offset, limit).await?;
            output::render(state.settings.format, &page, output::post_page)
        }
    }
}
