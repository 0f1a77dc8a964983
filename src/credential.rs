use zeroize::Zeroizing;

use crate::store::{Store, StoreError};

/// Key under which the API key is persisted in `app_meta`.
pub const API_KEY_META: &str = "btts_api_key";

/// Holds the backend API key and keeps it in sync with the local database.
///
/// An absent key means "not configured"; callers treat that as a reason to
/// skip network calls rather than as an error.
pub struct CredentialStore {
    store: Store,
    token: Option<Zeroizing<String>>,
}

impl CredentialStore {
    /// Wrap a store, loading any previously persisted key.
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let token = store
            .get_meta(API_KEY_META)?
            .filter(|t| !t.trim().is_empty())
            .map(Zeroizing::new);
        if token.is_some() {
            log::info!("Loaded persisted API key");
        }
        Ok(Self { store, token })
    }

    /// A credential store that forgets everything when dropped.
    pub fn ephemeral() -> Result<Self, StoreError> {
        Self::load(Store::open_in_memory()?)
    }

    /// Save `token`. A blank token is not a credential and clears the store.
    pub fn set(&mut self, token: &str) -> Result<(), StoreError> {
        if token.trim().is_empty() {
            return self.clear();
        }
        self.store.set_meta(API_KEY_META, token)?;
        self.token = Some(Zeroizing::new(token.to_string()));
        log::info!("API key updated");
        Ok(())
    }

    pub fn get(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.as_str())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.delete_meta(API_KEY_META)?;
        self.token = None;
        log::info!("API key cleared");
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

/// Reject keys that are obviously unusable before they get persisted.
pub fn validate_api_key(key: &str) -> bool {
    key.trim().len() > 1
}
