//! Settings stores
//!
//! [`SettingStore`] caches one table in memory and writes changes through to
//! it. [`ReadonlySettingStore`] adds a second table whose names can never be
//! changed, removed or refreshed.

mod core;
mod operations;
mod readonly;

pub use self::core::SettingStore;
pub use readonly::ReadonlySettingStore;

use crate::error::Result;
use crate::value::SettingValue;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// How a write is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Append to the setting's collection instead of replacing its value
    pub multiple: bool,

    /// Only change the in-memory mapping, never the table
    pub temporary: bool,
}

impl SetOptions {
    /// Persistent single-value write
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the collection
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Skip the table write
    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }
}

/// Read and write access to a table-backed settings mapping.
///
/// Reads never touch the database. Writes go through to the table unless
/// marked temporary; the mapping only changes once the statement succeeded.
///
/// # Example
///
/// ```rust
/// use tabset::{SettingStore, SettingValue, Settings, SqliteStorage, StoreConfig, TableColumns};
/// use serde_json::json;
///
/// let storage = SqliteStorage::in_memory()?;
/// storage.ensure_table("settings", &TableColumns::default())?;
///
/// let store = SettingStore::new(StoreConfig::builder("settings").build(), storage)?;
/// store.set("site.title", "Home")?.append("mail.hosts", "mx1")?;
///
/// assert_eq!(store.get_setting("site.title", json!(null)), SettingValue::from("Home"));
/// assert_eq!(store.get_setting("missing", "fallback"), SettingValue::from("fallback"));
/// # Ok::<(), tabset::Error>(())
/// ```
pub trait Settings {
    /// Cached value for `name`, if any
    fn get(&self, name: &str) -> Option<SettingValue>;

    /// Apply a write to `name`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write could not be persisted, or
    /// `Error::NotMultiple` when appending to a single-valued setting.
    fn set_setting(&self, name: &str, value: impl Into<Value>, options: SetOptions) -> Result<&Self>;

    /// Remove `name` from the mapping and, unless temporary, from the table
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete failed.
    fn remove_setting(&self, name: &str, temporary: bool) -> Result<&Self>;

    /// Reload the given names from the table
    ///
    /// # Errors
    ///
    /// Returns a storage error if the reload query failed.
    fn refresh_settings(&self, names: &[&str]) -> Result<&Self>;

    /// Snapshot of the whole mapping
    fn settings(&self) -> HashMap<String, SettingValue>;

    /// Cached value for `name`, or `default` if absent or null
    fn get_setting(&self, name: &str, default: impl Into<SettingValue>) -> SettingValue {
        match self.get(name) {
            Some(value) if !value.is_null() => value,
            _ => default.into(),
        }
    }

    /// Cached value deserialized into `T`
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the value does not fit `T`.
    fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.get(name).map(|value| value.deserialize()).transpose()
    }

    /// Whether `name` is cached, even if its value is null
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Persistently replace the value of `name`
    ///
    /// # Errors
    ///
    /// See [`Settings::set_setting`].
    fn set(&self, name: &str, value: impl Into<Value>) -> Result<&Self> {
        self.set_setting(name, value, SetOptions::new())
    }

    /// Replace the value of `name` in memory only
    ///
    /// # Errors
    ///
    /// See [`Settings::set_setting`].
    fn set_temporary(&self, name: &str, value: impl Into<Value>) -> Result<&Self> {
        self.set_setting(name, value, SetOptions::new().temporary())
    }

    /// Persistently append `value` to the collection of `name`
    ///
    /// # Errors
    ///
    /// See [`Settings::set_setting`].
    fn append(&self, name: &str, value: impl Into<Value>) -> Result<&Self> {
        self.set_setting(name, value, SetOptions::new().multiple())
    }

    /// Persistently remove `name`
    ///
    /// # Errors
    ///
    /// See [`Settings::remove_setting`].
    fn remove(&self, name: &str) -> Result<&Self> {
        self.remove_setting(name, false)
    }
}
