// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential lifecycle: turns a one-time browser authorization into a
//! durable, lazily refreshed session shared by every `quail` invocation.
//!
//! The pieces, leaves first:
//! - [`store::CredentialStore`] persists the session document on disk.
//! - [`flow::AuthorizationFlow`] runs the browser consent round trip.
//! - [`exchange::TokenExchanger`] trades a grant or refresh token for tokens.
//! - [`profile`] folds the caller's identity into the store after login.
//! - [`guard::SessionGuard`] gates every authenticated call.

pub mod callback;
pub mod exchange;
pub mod flow;
pub mod guard;
pub mod pkce;
pub mod profile;
pub mod store;

use serde::Serialize;
use time::OffsetDateTime;

/// Tokens are treated as expired this long before their recorded expiry so a
/// request never leaves with a token that lapses in flight.
pub const EXPIRY_SKEW: time::Duration = time::Duration::seconds(30);

/// Cached identity of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: u64,
    pub name: String,
    pub bio: String,
}

/// The locally persisted session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expiry: OffsetDateTime,
    pub user: Option<Identity>,
}

impl Session {
    /// Whether the access token must not be used at `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expiry - EXPIRY_SKEW
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        bearer(&self.token_type, &self.access_token)
    }
}

/// A usable access token handed out by the session guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    /// Identity snapshot at the time the token was handed out, if known.
    pub user: Option<Identity>,
}

impl AccessToken {
    pub fn authorization(&self) -> String {
        bearer(&self.token_type, &self.token)
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user.as_ref().map(|u| u.id).filter(|id| *id != 0)
    }
}

impl From<&Session> for AccessToken {
    fn from(session: &Session) -> Self {
        Self {
            token: session.access_token.clone(),
            token_type: session.token_type.clone(),
            user: session.user.clone(),
        }
    }
}

/// Normalize the scheme label: servers answer `bearer` or `Bearer`.
fn bearer(token_type: &str, token: &str) -> String {
    if token_type.is_empty() || token_type.eq_ignore_ascii_case("bearer") {
        format!("Bearer {token}")
    } else {
        format!("{token_type} {token}")
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
