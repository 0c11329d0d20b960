// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk credential document with whole-document atomic writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::credential::exchange::TokenSet;
use crate::credential::{Identity, Session};
use crate::error::AuthError;

/// Resolve the default credential document path.
///
/// Checks `$XDG_CONFIG_HOME/quail-cli/config.json`, then
/// `$HOME/.config/quail-cli/config.json`.
pub fn default_store_path() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("quail-cli/config.json");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/quail-cli/config.json");
    }
    PathBuf::from(".quail-cli/config.json")
}

// ---------------------------------------------------------------------------
// Document schema
// ---------------------------------------------------------------------------

/// Whole credential document. Keys this tool does not own are carried
/// through every rewrite untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    app: AppSection,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AppSection {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    refresh_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    token_type: String,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    expiry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserSection>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserSection {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    bio: String,
}

impl AppSection {
    fn session(&self) -> Option<Session> {
        if self.access_token.is_empty() {
            return None;
        }
        // A token without a readable expiry is treated as already expired so
        // the guard refreshes it before use.
        let expiry = match OffsetDateTime::parse(&self.expiry, &Rfc3339) {
            Ok(t) => t,
            Err(e) => {
                warn!(expiry = %self.expiry, err = %e, "unreadable session expiry, treating as expired");
                OffsetDateTime::UNIX_EPOCH
            }
        };
        Some(Session {
            access_token: self.access_token.clone(),
            refresh_token: Some(self.refresh_token.clone()).filter(|t| !t.is_empty()),
            token_type: self.token_type.clone(),
            expiry,
            user: self.user.as_ref().map(|u| Identity {
                id: u.id,
                name: u.name.clone(),
                bio: u.bio.clone(),
            }),
        })
    }

    fn apply_tokens(&mut self, tokens: &TokenSet) -> Result<(), time::error::Format> {
        self.access_token = tokens.access_token.clone();
        self.token_type = tokens.token_type.clone();
        self.expiry = tokens.expiry.format(&Rfc3339)?;
        if let Some(ref rt) = tokens.refresh_token {
            self.refresh_token = rt.clone();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Handle to the credential document at a fixed path.
///
/// Every mutation is a full read-modify-write of the document. There is no
/// cross-process locking: two processes refreshing at once can lose one
/// refresh, which only costs an extra refresh later.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. A missing document, or one without an access
    /// token, means no session.
    pub fn load(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.read()?.app.session())
    }

    /// Record tokens from a fresh login. The identity snapshot is cleared
    /// until the profile bootstrap fills it in.
    pub fn save_login(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.update(|app| {
            app.refresh_token.clear();
            app.user = None;
            app.apply_tokens(tokens)
        })
    }

    /// Record rotated tokens from a refresh. The identity snapshot is kept
    /// and the refresh token only changes if the server issued a new one.
    pub fn save_refresh(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.update(|app| app.apply_tokens(tokens))
    }

    /// Fold an identity snapshot into the document.
    pub fn save_identity(&self, identity: &Identity) -> Result<(), AuthError> {
        self.update(|app| {
            app.user = Some(UserSection {
                id: identity.id,
                name: identity.name.clone(),
                bio: identity.bio.clone(),
            });
            Ok(())
        })
    }

    /// Destroy the session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, AuthError> {
        let mut doc = self.read()?;
        let existed = !doc.app.access_token.is_empty();
        let other = std::mem::take(&mut doc.app.other);
        doc.app = AppSection { other, ..AppSection::default() };
        if existed || self.path.exists() {
            self.write(&doc)?;
        }
        Ok(existed)
    }

    fn update(
        &self,
        f: impl FnOnce(&mut AppSection) -> Result<(), time::error::Format>,
    ) -> Result<(), AuthError> {
        let mut doc = self.read()?;
        f(&mut doc.app).map_err(|e| AuthError::store(&self.path, e))?;
        self.write(&doc)
    }

    fn read(&self) -> Result<Document, AuthError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no credential document");
                return Ok(Document::default());
            }
            Err(e) => return Err(AuthError::store(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(Document::default());
        }
        serde_json::from_str(&contents).map_err(|e| AuthError::store(&self.path, e))
    }

    /// Write to a temp file in the same directory, then rename over the
    /// target so a crash mid-write leaves the previous document intact.
    fn write(&self, doc: &Document) -> Result<(), AuthError> {
        let err = |e: &dyn std::fmt::Display| AuthError::store(&self.path, e);
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| err(&e))?;

        let json = serde_json::to_vec_pretty(doc).map_err(|e| err(&e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| err(&e))?;
        tmp.write_all(&json).map_err(|e| err(&e))?;
        tmp.as_file().sync_all().map_err(|e| err(&e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| err(&e))?;
        }
        tmp.persist(&self.path).map_err(|e| err(&e.error))?;
        debug!(path = %self.path.display(), "credential document written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
