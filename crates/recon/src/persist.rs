use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::{ReconciliationState, STATE_VERSION};

/// Namespace the state is stored under unless a caller picks another.
pub const DEFAULT_NAMESPACE: &str = "stockscan";

/// Minimal string key-value store the gateway persists into.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, for tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Serializes [`ReconciliationState`] to JSON under one fixed namespace key.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    store: S,
    namespace: String,
}

impl<S: StateStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&mut self, state: &ReconciliationState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.store.set(&self.namespace, &json)?;
        log::debug!(
            "saved state '{}' ({} records, {} scanned)",
            self.namespace,
            state.records.len(),
            state.scanned.len()
        );
        Ok(())
    }

    /// Stored state, or `None` when nothing usable is stored.
    ///
    /// A document that fails to decode, or was written by a newer schema, is
    /// treated as absent and logged.
    pub fn load(&self) -> Result<Option<ReconciliationState>, StoreError> {
        let Some(json) = self.store.get(&self.namespace)? else {
            return Ok(None);
        };

        let state: ReconciliationState = match serde_json::from_str(&json) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("discarding unreadable state '{}': {e}", self.namespace);
                return Ok(None);
            }
        };

        if state.version > STATE_VERSION {
            log::warn!(
                "discarding state '{}': version {} is newer than {}",
                self.namespace,
                state.version,
                STATE_VERSION
            );
            return Ok(None);
        }

        Ok(Some(state))
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(&self.namespace)
    }
}
