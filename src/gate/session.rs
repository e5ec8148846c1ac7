//! Tab-scoped session state. The gate receives a [`SessionContext`] instead of reaching
//! for browser storage directly, so the login -> OTP hand-off can be exercised without a
//! browser.

use crate::{config::FINGERPRINT_FIELD, fingerprint::Fingerprint};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session storage unavailable")]
    Unavailable,
    #[error("session storage write failed: {0}")]
    Write(String),
}

/// Key/value storage cleared when the tab or session ends.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the backing storage rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: &str);
}

/// In-process store. Clones share the same entries, like two pages of one tab.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Session dependencies for one page load.
#[derive(Debug, Clone)]
pub struct SessionContext<T> {
    store: T,
    key: String,
}

impl<T: SessionStore> SessionContext<T> {
    #[must_use]
    pub fn new(store: T) -> Self {
        Self {
            store,
            key: FINGERPRINT_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Fingerprint accepted earlier in this session. Malformed entries are ignored.
    #[must_use]
    pub fn cached_fingerprint(&self) -> Option<Fingerprint> {
        let raw = self.store.get(&self.key)?;
        match Fingerprint::parse(&raw) {
            Ok(fingerprint) => Some(fingerprint),
            Err(err) => {
                warn!("ignoring cached fingerprint: {err}");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn remember(&self, fingerprint: &Fingerprint) -> Result<(), SessionError> {
        self.store.set(&self.key, fingerprint.as_str())
    }

    pub fn forget(&self) {
        self.store.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::DigestAlgorithm;

    #[test]
    fn remember_then_read_back() {
        let session = SessionContext::new(MemorySessionStore::new());
        assert_eq!(session.cached_fingerprint(), None);

        let fingerprint = Fingerprint::from_joined("a|b", DigestAlgorithm::Sha256);
        session.remember(&fingerprint).unwrap();

        assert_eq!(session.cached_fingerprint(), Some(fingerprint.clone()));
        assert_eq!(
            session.store().get("browser_fingerprint").as_deref(),
            Some(fingerprint.as_str())
        );

        session.forget();
        assert_eq!(session.cached_fingerprint(), None);
    }

    #[test]
    fn clones_share_entries() {
        let store = MemorySessionStore::new();
        let login = SessionContext::new(store.clone());
        let verify = SessionContext::new(store);

        let fingerprint = Fingerprint::from_joined("x", DigestAlgorithm::Legacy);
        login.remember(&fingerprint).unwrap();

        assert_eq!(verify.cached_fingerprint(), Some(fingerprint));
    }

    #[test]
    fn malformed_cache_is_ignored() {
        let store = MemorySessionStore::new();
        store.set("browser_fingerprint", "not-a-digest").unwrap();
        let session = SessionContext::new(store);
        assert_eq!(session.cached_fingerprint(), None);
    }

    #[test]
    fn custom_key_is_honoured() {
        let store = MemorySessionStore::new();
        let session = SessionContext::new(store.clone()).with_key("fp");
        let fingerprint = Fingerprint::from_joined("x", DigestAlgorithm::Sha256);
        session.remember(&fingerprint).unwrap();

        assert_eq!(session.key(), "fp");
        assert!(store.get("browser_fingerprint").is_none());
        assert!(store.get("fp").is_some());
    }
}
