//! Credential pair access on top of a `KeyValueStore`
//!
//! The access and refresh tokens are always written together and cleared
//! together (along with the cached user). Only the gateway's refresh
//! procedure and the login flow write tokens.

use common::Secret;
use tracing::debug;

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use crate::error::Result;
use crate::store::KeyValueStore;
use crate::token::TokenPair;

/// Snapshot of the stored tokens. Either may be absent (signed out, or a
/// store that was partially written by an older client).
#[derive(Debug, Clone, Default)]
pub struct CredentialPair {
    pub access_token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
}

impl CredentialPair {
    /// Read both tokens from the store.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(Self {
            access_token: store.get(ACCESS_TOKEN_KEY).await?.map(Secret::new),
            refresh_token: store.get(REFRESH_TOKEN_KEY).await?.map(Secret::new),
        })
    }

    /// Whether an access token is present.
    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Current access token, read fresh from the store.
pub async fn access_token(store: &dyn KeyValueStore) -> Result<Option<Secret<String>>> {
    Ok(store.get(ACCESS_TOKEN_KEY).await?.map(Secret::new))
}

/// Current refresh token, read fresh from the store.
pub async fn refresh_token(store: &dyn KeyValueStore) -> Result<Option<Secret<String>>> {
    Ok(store.get(REFRESH_TOKEN_KEY).await?.map(Secret::new))
}

/// Persist a new token pair (after login or a successful refresh).
pub async fn save_pair(store: &dyn KeyValueStore, pair: &TokenPair) -> Result<()> {
    store
        .set(ACCESS_TOKEN_KEY, pair.access_token.clone())
        .await?;
    store
        .set(REFRESH_TOKEN_KEY, pair.refresh_token.clone())
        .await?;
    debug!("stored rotated token pair");
    Ok(())
}

/// Persist the cached signed-in user (opaque JSON string from the login
/// response).
pub async fn save_user(store: &dyn KeyValueStore, user: &serde_json::Value) -> Result<()> {
    store.set(USER_KEY, user.to_string()).await
}

/// Remove every session value: access token, refresh token and cached user.
///
/// All three removals are attempted even if one fails; the first failure is
/// returned.
pub async fn purge(store: &dyn KeyValueStore) -> Result<()> {
    let mut first_error = None;
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
        if let Err(e) = store.remove(key).await {
            first_error.get_or_insert(e);
        }
    }
    debug!("purged session credentials");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.into(),
            refresh_token: refresh.into(),
        }
    }

    #[tokio::test]
    async fn empty_store_loads_signed_out() {
        let store = MemoryStore::new();
        let creds = CredentialPair::load(&store).await.unwrap();
        assert!(!creds.is_signed_in());
        assert!(creds.refresh_token.is_none());
    }

    #[tokio::test]
    async fn save_pair_writes_both_tokens() {
        let store = MemoryStore::new();
        save_pair(&store, &pair("A1", "R1")).await.unwrap();

        let creds = CredentialPair::load(&store).await.unwrap();
        assert_eq!(creds.access_token.unwrap().expose(), "A1");
        assert_eq!(creds.refresh_token.unwrap().expose(), "R1");
    }

    #[tokio::test]
    async fn save_pair_replaces_previous_pair() {
        let store = MemoryStore::new();
        save_pair(&store, &pair("A1", "R1")).await.unwrap();
        save_pair(&store, &pair("A2", "R2")).await.unwrap();

        assert_eq!(access_token(&store).await.unwrap().unwrap().expose(), "A2");
        assert_eq!(refresh_token(&store).await.unwrap().unwrap().expose(), "R2");
    }

    #[tokio::test]
    async fn purge_removes_tokens_and_user() {
        let store = MemoryStore::new();
        save_pair(&store, &pair("A1", "R1")).await.unwrap();
        save_user(&store, &serde_json::json!({"id": 7, "name": "Asha"}))
            .await
            .unwrap();
        assert_eq!(store.len().await, 3);

        purge(&store).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn credential_pair_debug_is_redacted() {
        let store = MemoryStore::new();
        save_pair(&store, &pair("at_secret", "rt_secret")).await.unwrap();
        let creds = CredentialPair::load(&store).await.unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("at_secret"), "got: {debug}");
        assert!(!debug.contains("rt_secret"), "got: {debug}");
    }
}
