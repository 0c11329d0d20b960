// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands: `login`, `logout`, `status`, `me`, `lists`, `post`,
//! `mcp`, `version`.

pub mod auth;
pub mod list;
pub mod post;

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::credential::flow::browser_for;
use crate::credential::guard::Interaction;
use crate::mcp::McpArgs;
use crate::state::AppState;

pub use list::ListsArgs;
pub use post::PostCommand;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Log in through the browser and save the session.
    Login,
    /// Remove the saved session.
    Logout,
    /// Show the saved session without contacting the server.
    Status,
    /// Show the logged-in user.
    Me,
    /// List your channels, or the posts of one channel.
    Lists(ListsArgs),
    /// Read and manage posts.
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
    /// Serve the agent tools over MCP (stdio by default).
    Mcp(McpArgs),
    /// Print the version.
    Version,
}

/// Run the parsed command line to completion.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let settings = config.settings()?;
    let shutdown = CancellationToken::new();
    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupted");
                sd.cancel();
            }
        });
    }

    match config.command {
        Command::Version => {
            println!("quail {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Mcp(ref args) => {
            let browser = browser_for(&settings);
            let state = AppState::new(settings, browser, Interaction::NonInteractive, shutdown);
            crate::mcp::serve(state, args).await
        }
        ref command => {
            let mode = if std::io::stdin().is_terminal() {
                Interaction::Interactive
            } else {
                Interaction::NonInteractive
            };
            let browser = browser_for(&settings);
            let state = AppState::new(settings, browser, mode, shutdown);
            let out = execute(command, &state).await?;
            if !out.is_empty() {
                println!("{out}");
            }
            Ok(())
        }
    }
}

/// Execute one non-server command and return its rendered output.
pub async fn execute(command: &Command, state: &AppState) -> anyhow::Result<String> {
    match command {
        Command::Login => auth::login(state).await,
        Command::Logout => auth::logout(state),
        Command::Status => auth::status(state),
        Command::Me => list::me(state).await,
        Command::Lists(args) => list::lists(state, args).await,
        Command::Post { command } => post::run(state, command).await,
        Command::Mcp(_) | Command::Version => Ok(String::new()),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
