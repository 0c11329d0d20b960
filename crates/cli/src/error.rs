// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::path::PathBuf;

/// Failure conditions surfaced by the credential lifecycle.
///
/// Every variant names the step that failed so the CLI exit path and agent
/// tool responses can tell the user whether re-running `quail login` helps.
#[derive(Debug)]
pub enum AuthError {
    /// User denied consent, the callback timed out, or the callback was
    /// malformed. Carries the authorization URL for a manual retry.
    AuthorizationFailed { reason: String, auth_url: String },
    /// Network or protocol failure talking to the token endpoint.
    TokenExchangeFailed { step: ExchangeStep, reason: String },
    /// The stored session expired and could not be refreshed without the user.
    SessionExpiredNeedsLogin { reason: String },
    /// The on-disk credential document could not be read or written.
    CredentialStoreUnavailable { path: PathBuf, reason: String },
}

/// Which token exchange was in flight when a [`AuthError::TokenExchangeFailed`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStep {
    AuthorizationCode,
    Refresh,
}

impl ExchangeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Refresh => "refresh_token",
        }
    }
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationFailed { .. } => "AUTHORIZATION_FAILED",
            Self::TokenExchangeFailed { .. } => "TOKEN_EXCHANGE_FAILED",
            Self::SessionExpiredNeedsLogin { .. } => "SESSION_EXPIRED_NEEDS_LOGIN",
            Self::CredentialStoreUnavailable { .. } => "CREDENTIAL_STORE_UNAVAILABLE",
        }
    }

    /// Process exit code for the command-line entry point.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthorizationFailed { .. } | Self::SessionExpiredNeedsLogin { .. } => 3,
            Self::TokenExchangeFailed { .. } | Self::CredentialStoreUnavailable { .. } => 1,
        }
    }

    /// Authorization URL to retry manually, when the failure has one.
    pub fn auth_url(&self) -> Option<&str> {
        match self {
            Self::AuthorizationFailed { auth_url, .. } if !auth_url.is_empty() => Some(auth_url),
            _ => None,
        }
    }

    pub(crate) fn store(path: &std::path::Path, reason: impl fmt::Display) -> Self {
        Self::CredentialStoreUnavailable { path: path.to_path_buf(), reason: reason.to_string() }
    }

    pub(crate) fn authorization(reason: impl Into<String>, auth_url: impl Into<String>) -> Self {
        Self::AuthorizationFailed { reason: reason.into(), auth_url: auth_url.into() }
    }

    pub(crate) fn exchange(step: ExchangeStep, reason: impl Into<String>) -> Self {
        Self::TokenExchangeFailed { step, reason: reason.into() }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthorizationFailed { reason, auth_url } => {
                write!(f, "{}: authorization failed: {reason}", self.as_str())?;
                if !auth_url.is_empty() {
                    write!(f, " (open {auth_url} to retry manually)")?;
                }
                Ok(())
            }
            Self::TokenExchangeFailed { step, reason } => {
                write!(f, "{}: {} exchange failed: {reason}", self.as_str(), step.as_str())
            }
            Self::SessionExpiredNeedsLogin { reason } => {
                write!(f, "{}: session expired ({reason}); run `quail login`", self.as_str())
            }
            Self::CredentialStoreUnavailable { path, reason } => {
                write!(f, "{}: {}: {reason}", self.as_str(), path.display())
            }
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
