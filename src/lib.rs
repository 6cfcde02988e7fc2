//! # tabset - table-backed settings
//!
//! A small settings layer over a relational table: the table is loaded into
//! memory once, reads are served from that cache, and writes go through to
//! the table unless they are marked temporary.
//!
//! ## Features
//!
//! - **Write-through store**: [`SettingStore`] keeps a `name → value` mapping in sync with its table
//! - **Multiple values**: rows flagged `multiple` accumulate into an ordered collection
//! - **Temporary writes**: change the in-memory mapping without touching the table
//! - **Read-only tables**: [`ReadonlySettingStore`] protects names loaded from a second table
//! - **Registry**: [`SettingsRegistry`] hands out one shared, lazily loaded instance per store
//! - **Change events**: listeners run after every applied set or remove
//!
//! ## Quick Start
//!
//! ```rust
//! use tabset::{SettingValue, Settings, SettingsRegistry, SqliteStorage, StoreConfig, TableColumns};
//! use serde_json::json;
//!
//! let storage = SqliteStorage::in_memory()?;
//! storage.ensure_table("settings", &TableColumns::default())?;
//!
//! let registry = SettingsRegistry::builder(storage)
//!     .with_store(StoreConfig::builder("settings").build())
//!     .build()?;
//!
//! let settings = registry.store("settings")?;
//! settings
//!     .set("ui.theme", "dark")?
//!     .append("mail.hosts", "mx1.example.org")?
//!     .append("mail.hosts", "mx2.example.org")?
//!     .set_temporary("session.debug", true)?;
//!
//! let hosts: Vec<String> = settings.get_as("mail.hosts")?.unwrap_or_default();
//! assert_eq!(hosts.len(), 2);
//! assert_eq!(settings.get_setting("ui.font", json!(14)), SettingValue::from(json!(14)));
//! # Ok::<(), tabset::Error>(())
//! ```
//!
//! ## Read-only settings
//!
//! ```rust
//! use tabset::{ReadonlySettingStore, Settings, SqliteStorage, StoreConfig, TableColumns};
//!
//! let storage = SqliteStorage::in_memory()?;
//! for table in ["settings", "settings_locked"] {
//!     storage.ensure_table(table, &TableColumns::default())?;
//! }
//! storage.with_connection(|conn| {
//!     conn.execute(
//!         "INSERT INTO settings_locked (name, content, multiple) VALUES ('app.edition', 'pro', 0)",
//!         (),
//!     )
//! })?;
//!
//! let config = StoreConfig::builder("settings")
//!     .readonly_table("settings_locked")
//!     .build();
//! let store = ReadonlySettingStore::new(config, storage)?;
//!
//! let err = store.set("app.edition", "free").unwrap_err();
//! assert_eq!(err.code(), Some(401));
//! assert_eq!(err.setting_name(), Some("app.edition"));
//! # Ok::<(), tabset::Error>(())
//! ```

mod error;
mod events;
mod sync;
mod value;

pub mod config;
pub mod registry;
pub mod storage;
pub mod store;

pub use config::{RecordClassifier, SettingRecord, StoreConfig, StoreConfigBuilder, TableColumns};
pub use error::{Error, ReadonlyOperation, Result};
pub use events::{ChangeCallback, EventManager};
pub use registry::{SettingsRegistry, SettingsRegistryBuilder};
pub use storage::{Row, SqliteStorage, StorageBackend};
pub use store::{ReadonlySettingStore, SetOptions, SettingStore, Settings};
pub use value::{SettingValue, is_truthy};
