//! Registry of lazily created settings stores
//!
//! The application root owns one [`SettingsRegistry`]. Store definitions are
//! registered up front; the first request for a store loads its table, and
//! every later request returns the same shared instance.

mod builder;

pub use builder::SettingsRegistryBuilder;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::storage::{SqliteStorage, StorageBackend};
use crate::store::{ReadonlySettingStore, SettingStore};
use crate::sync::RwLockExt;

use log::info;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Owner of the shared store instances for one database.
///
/// # Example
///
/// ```rust
/// use tabset::{Settings, SettingsRegistry, SqliteStorage, StoreConfig, TableColumns};
/// use std::sync::Arc;
///
/// let storage = SqliteStorage::in_memory()?;
/// storage.ensure_table("settings", &TableColumns::default())?;
///
/// let registry = SettingsRegistry::builder(storage)
///     .with_store(StoreConfig::builder("settings").build())
///     .build()?;
///
/// let store = registry.store("settings")?;
/// store.set("ui.theme", "dark")?;
/// assert!(Arc::ptr_eq(&store, &registry.store("settings")?));
/// # Ok::<(), tabset::Error>(())
/// ```
pub struct SettingsRegistry<S: StorageBackend = SqliteStorage> {
    /// Database shared by every store
    storage: S,

    /// Registered definitions, keyed by store name
    definitions: RwLock<HashMap<String, StoreConfig>>,

    /// Constructed plain stores
    stores: RwLock<HashMap<String, Arc<SettingStore<S>>>>,

    /// Constructed read-only stores
    readonly_stores: RwLock<HashMap<String, Arc<ReadonlySettingStore<S>>>>,
}

impl<S: StorageBackend> SettingsRegistry<S> {
    /// Create an empty registry over `storage`
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            definitions: RwLock::new(HashMap::new()),
            stores: RwLock::new(HashMap::new()),
            readonly_stores: RwLock::new(HashMap::new()),
        }
    }

    /// Create a builder for `SettingsRegistry` with a fluent API.
    pub fn builder(storage: S) -> SettingsRegistryBuilder<S> {
        SettingsRegistryBuilder::new(storage)
    }

    /// Get the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Register a store definition. Nothing is loaded until the store is
    /// first requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or its name is taken.
    pub fn register(&self, config: StoreConfig) -> Result<()> {
        config.validate()?;

        let mut definitions = self.definitions.write_recovered()?;
        if definitions.contains_key(&config.name) {
            return Err(Error::StoreAlreadyRegistered(config.name));
        }

        info!("Registered settings store: {}", config.name);
        definitions.insert(config.name.clone(), config);
        Ok(())
    }

    /// Get the shared plain store registered as `name`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreNotRegistered` for an unknown name, `Error::Config`
    /// if the definition has a read-only table, or the load error.
    pub fn store(&self, name: &str) -> Result<Arc<SettingStore<S>>> {
        self.get_or_load(&self.stores, name, false, SettingStore::new)
    }

    /// Get the shared read-only store registered as `name`, loading it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreNotRegistered` for an unknown name, `Error::Config`
    /// if the definition has no read-only table, or the load error.
    pub fn readonly_store(&self, name: &str) -> Result<Arc<ReadonlySettingStore<S>>> {
        self.get_or_load(&self.readonly_stores, name, true, ReadonlySettingStore::new)
    }

    /// Check if a store has been constructed
    pub fn is_loaded(&self, name: &str) -> bool {
        self.stores
            .read_recovered()
            .is_ok_and(|stores| stores.contains_key(name))
            || self
                .readonly_stores
                .read_recovered()
                .is_ok_and(|stores| stores.contains_key(name))
    }

    /// List all registered store names
    pub fn store_names(&self) -> Vec<String> {
        self.definitions
            .read_recovered()
            .map(|definitions| definitions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn get_or_load<T, F>(
        &self,
        cache: &RwLock<HashMap<String, Arc<T>>>,
        name: &str,
        readonly: bool,
        load: F,
    ) -> Result<Arc<T>>
    where
        F: FnOnce(StoreConfig, S) -> Result<T>,
    {
        if let Some(store) = cache.read_recovered()?.get(name) {
            return Ok(Arc::clone(store));
        }

        let config = self
            .definitions
            .read_recovered()?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::StoreNotRegistered(name.to_string()))?;

        if config.is_readonly() != readonly {
            let kind = if readonly { "plain" } else { "read-only" };
            return Err(Error::Config(format!("Settings store '{name}' is a {kind} store")));
        }

        // Another caller may have loaded it while we were unlocked
        let mut stores = cache.write_recovered()?;
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(load(config, self.storage.clone())?);
        stores.insert(name.to_string(), Arc::clone(&store));
        info!("Loaded settings store: {name}");
        Ok(store)
    }
}
