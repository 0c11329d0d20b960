// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod client;
pub mod command;
pub mod config;
pub mod credential;
pub mod datetime;
pub mod error;
pub mod frontmatter;
pub mod mcp;
pub mod output;
pub mod state;
pub mod test_support;

use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Build the shared HTTP client used by every component of one invocation.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    ensure_crypto();
    let client = reqwest::Client::builder()
        .user_agent(concat!("quail-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}
