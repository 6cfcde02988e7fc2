//! Builder for SettingsRegistry

use crate::config::StoreConfig;
use crate::error::Result;
use crate::storage::StorageBackend;

use super::SettingsRegistry;

/// Builder for creating a [`SettingsRegistry`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use tabset::{SettingsRegistry, SqliteStorage, StoreConfig};
///
/// let registry = SettingsRegistry::builder(SqliteStorage::in_memory()?)
///     .with_store(StoreConfig::builder("settings").build())
///     .with_store(
///         StoreConfig::builder("site_settings")
///             .readonly_table("site_settings_locked")
///             .build(),
///     )
///     .build()?;
/// assert_eq!(registry.store_names().len(), 2);
/// # Ok::<(), tabset::Error>(())
/// ```
pub struct SettingsRegistryBuilder<S: StorageBackend> {
    storage: S,
    stores: Vec<StoreConfig>,
}

impl<S: StorageBackend> SettingsRegistryBuilder<S> {
    /// Create a new builder over `storage`
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            stores: Vec::new(),
        }
    }

    /// Register a store definition
    pub fn with_store(mut self, config: StoreConfig) -> Self {
        self.stores.push(config);
        self
    }

    /// Build the [`SettingsRegistry`].
    ///
    /// No table is read here; stores load on first request.
    ///
    /// # Errors
    ///
    /// Returns an error if a definition is invalid or two share a name.
    pub fn build(self) -> Result<SettingsRegistry<S>> {
        let registry = SettingsRegistry::new(self.storage);
        for config in self.stores {
            registry.register(config)?;
        }
        Ok(registry)
    }
}
