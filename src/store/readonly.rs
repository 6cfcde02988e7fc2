use super::core::SettingStore;
use super::{SetOptions, Settings};
use crate::config::StoreConfig;
use crate::error::{Error, ReadonlyOperation, Result};
use crate::events::EventManager;
use crate::storage::{SqliteStorage, StorageBackend};
use crate::value::SettingValue;

use log::{debug, info};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Settings store with a second, read-only table.
///
/// Names loaded from the read-only table are protected: setting or removing
/// them fails with [`Error::ReadonlySetting`] and refreshing them is skipped.
/// Their values are still served by every read.
pub struct ReadonlySettingStore<S: StorageBackend = SqliteStorage> {
    inner: SettingStore<S>,
    protected: HashSet<String>,
}

impl<S: StorageBackend> ReadonlySettingStore<S> {
    /// Create the store: load the read-only table, recording its names as
    /// protected, then load the regular table.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the definition has no read-only table, or
    /// an error from either load query.
    pub fn new(config: StoreConfig, storage: S) -> Result<Self> {
        let readonly_table = config.readonly_table.clone().ok_or_else(|| {
            Error::Config(format!("Store '{}' has no read-only table", config.name))
        })?;

        let inner = SettingStore::unloaded(config, storage)?;
        let mut protected = HashSet::new();
        inner.import_table(&readonly_table, |record| {
            protected.insert(record.name.clone());
        })?;
        let loaded = inner.import_table(&inner.config.table, |_| {})?;

        info!(
            "Loaded {} protected names from '{readonly_table}' and {loaded} rows from '{}'",
            protected.len(),
            inner.config.table
        );
        Ok(Self { inner, protected })
    }

    /// Whether `name` came from the read-only table
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    /// Every protected name
    pub fn protected_names(&self) -> &HashSet<String> {
        &self.protected
    }

    /// Get the store definition
    pub fn config(&self) -> &StoreConfig {
        self.inner.config()
    }

    /// Get the storage backend
    pub fn storage(&self) -> &S {
        self.inner.storage()
    }

    /// Get the event manager for registering change listeners
    pub fn events(&self) -> &Arc<EventManager> {
        self.inner.events()
    }

    /// Number of cached setting names, protected ones included
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no setting name is cached
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<S: StorageBackend> std::fmt::Debug for ReadonlySettingStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadonlySettingStore")
            .field("config", &self.inner.config)
            .field("protected", &self.protected)
            .finish_non_exhaustive()
    }
}

impl<S: StorageBackend> Settings for ReadonlySettingStore<S> {
    fn get(&self, name: &str) -> Option<SettingValue> {
        self.inner.get(name)
    }

    fn set_setting(&self, name: &str, value: impl Into<Value>, options: SetOptions) -> Result<&Self> {
        if self.is_protected(name) {
            return Err(Error::readonly(name, ReadonlyOperation::Change));
        }
        self.inner.set_setting(name, value, options)?;
        Ok(self)
    }

    fn remove_setting(&self, name: &str, temporary: bool) -> Result<&Self> {
        if self.is_protected(name) {
            return Err(Error::readonly(name, ReadonlyOperation::Remove));
        }
        self.inner.remove_setting(name, temporary)?;
        Ok(self)
    }

    fn refresh_settings(&self, names: &[&str]) -> Result<&Self> {
        let names: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.is_protected(name))
            .collect();
        debug!("Refreshing {} unprotected names", names.len());

        self.inner.refresh_settings(&names)?;
        Ok(self)
    }

    fn settings(&self) -> HashMap<String, SettingValue> {
        self.inner.settings()
    }
}
