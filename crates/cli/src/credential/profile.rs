// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-login identity bootstrap.

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::credential::store::CredentialStore;
use crate::credential::{AccessToken, Identity};
use crate::error::AuthError;

/// Fetch the caller's identity with a freshly issued token and fold it into
/// the store. The tokens are already persisted, so a failed fetch leaves a
/// usable session without identity and returns `Ok(None)`. A failed store
/// write is still fatal.
pub async fn bootstrap(
    store: &CredentialStore,
    api: &ApiClient,
    token: &AccessToken,
) -> Result<Option<Identity>, AuthError> {
    let user = match api.get_me(token).await {
        Ok(user) => user,
        Err(e) => {
            warn!(err = %e, "could not fetch profile; session saved without identity");
            return Ok(None);
        }
    };
    let identity = Identity { id: user.id, name: user.name, bio: user.bio };
    store.save_identity(&identity)?;
    info!(user_id = identity.id, "profile saved");
    Ok(Some(identity))
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
