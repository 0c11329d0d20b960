// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::command::Command;
use crate::credential::store::default_store_path;
use crate::output::Format;

/// Default OAuth scope requested at login.
pub const DEFAULT_SCOPE: &str = "user.full post.write";

/// Command-line client for Quaily.
#[derive(Debug, Parser)]
#[command(name = "quail", version, about)]
pub struct Config {
    /// Credential store path (default: $XDG_CONFIG_HOME/quail-cli/config.json).
    #[arg(long, env = "QUAIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Quail API base URL.
    #[arg(long, env = "QUAIL_API_BASE", default_value = "https://api.quail.ink", global = true)]
    pub api_base: String,

    /// Quail auth base URL (also the public site URL).
    #[arg(long, env = "QUAIL_AUTH_BASE", default_value = "https://quaily.com", global = true)]
    pub auth_base: String,

    /// Output format (human or json).
    #[arg(long, env = "QUAIL_FORMAT", default_value = "human", global = true)]
    pub format: String,

    /// OAuth client ID.
    #[arg(long, env = "QUAIL_CLIENT_ID", default_value = "quail-cli", global = true)]
    pub client_id: String,

    /// OAuth scope requested at login.
    #[arg(long, env = "QUAIL_SCOPE", default_value = DEFAULT_SCOPE, global = true)]
    pub scope: String,

    /// Local port for the login callback (0 picks a free port).
    #[arg(long, env = "QUAIL_CALLBACK_PORT", default_value_t = 0, global = true)]
    pub callback_port: u16,

    /// Seconds to wait for the browser login to complete.
    #[arg(long, env = "QUAIL_LOGIN_TIMEOUT", default_value_t = 300, global = true)]
    pub login_timeout: u64,

    /// Print the login URL instead of opening a browser.
    #[arg(long, env = "QUAIL_NO_BROWSER", global = true)]
    pub no_browser: bool,

    /// Log format (json or text).
    #[arg(long, env = "QUAIL_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "QUAIL_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Explicit per-invocation settings handed to every component that needs
/// base URLs, the output format, or the shared HTTP client.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub auth_base: String,
    pub format: Format,
    pub client_id: String,
    pub scope: String,
    pub callback_port: u16,
    pub login_timeout: Duration,
    pub open_browser: bool,
    pub store_path: PathBuf,
    pub http: reqwest::Client,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.format_enum()?;
        for (flag, url) in [("--api-base", &self.api_base), ("--auth-base", &self.auth_base)] {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("invalid {flag} {url:?}: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("{flag} must be an http(s) URL, got {url:?}");
            }
        }
        if self.login_timeout == 0 {
            anyhow::bail!("--login-timeout must be greater than zero");
        }
        if self.client_id.trim().is_empty() {
            anyhow::bail!("--client-id must not be empty");
        }
        Ok(())
    }

    /// Parse the output format string into an enum.
    pub fn format_enum(&self) -> anyhow::Result<Format> {
        self.format.parse()
    }

    /// Resolve the credential store path.
    pub fn store_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_store_path)
    }

    /// Build the explicit [`Settings`] for this invocation.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings {
            api_base: self.api_base.trim_end_matches('/').to_owned(),
            auth_base: self.auth_base.trim_end_matches('/').to_owned(),
            format: self.format_enum()?,
            client_id: self.client_id.clone(),
            scope: self.scope.clone(),
            callback_port: self.callback_port,
            login_timeout: Duration::from_secs(self.login_timeout),
            open_browser: !self.no_browser,
            store_path: self.store_path(),
            http: crate::http_client()?,
        })
    }
}

impl Settings {
    /// Build settings for tests pointing both bases at a local mock server.
    #[doc(hidden)]
    pub fn test(base: &str, store_path: PathBuf) -> anyhow::Result<Self> {
        Ok(Self {
            api_base: base.trim_end_matches('/').to_owned(),
            auth_base: base.trim_end_matches('/').to_owned(),
            format: Format::Json,
            client_id: "quail-cli-test".into(),
            scope: DEFAULT_SCOPE.into(),
            callback_port: 0,
            login_timeout: Duration::from_secs(5),
            open_browser: false,
            store_path,
            http: crate::http_client()?,
        })
    }

    /// Public URL of a channel.
    pub fn channel_url(&self, channel_slug: &str) -> String {
        format!("{}/{channel_slug}", self.auth_base)
    }

    /// Public URL of a post within a channel.
    pub fn post_url(&self, channel_slug: &str, post_slug: &str) -> String {
        format!("{}/{channel_slug}/p/{post_slug}", self.auth_base)
    }
}

/// Split a public post URL (`{site}/{channel}/p/{post}` or
/// `{site}/{channel}/{post}`) into channel and post slugs.
pub fn parse_post_url(url: &str) -> anyhow::Result<Option<(String, String)>> {
    let re = regex::Regex::new(r"^https?://[^/]+/([^/?#]+)/(?:p/)?([^/?#]+)")?;
    Ok(re.captures(url.trim()).map(|c| (c[1].to_owned(), c[2].to_owned())))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
