// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::debug;

use quail::config::Config;
use quail::error::AuthError;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);
    quail::ensure_crypto();

    if let Err(e) = quail::command::run(config).await {
        debug!("fatal: {e:?}");
        eprintln!("error: {e:#}");
        let code = e.downcast_ref::<AuthError>().map_or(1, AuthError::exit_code);
        std::process::exit(code);
    }
}

/// Logs go to stderr so stdout carries only command output (or MCP frames).
fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}
