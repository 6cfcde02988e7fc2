use crate::config::{SettingRecord, StoreConfig};
use crate::error::Result;
use crate::events::EventManager;
use crate::storage::{Row, SqliteStorage, StorageBackend};
use crate::sync::RwLockExt;
use crate::value::SettingValue;

use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

/// Settings store over one relational table.
///
/// The whole table is loaded into memory when the store is created; every
/// read is served from that mapping. Writes are applied to the table first
/// and to the mapping once the statement succeeded.
///
/// # Example
///
/// ```rust
/// use tabset::{Settings, SettingStore, SqliteStorage, StoreConfig, TableColumns};
///
/// let storage = SqliteStorage::in_memory()?;
/// storage.ensure_table("settings", &TableColumns::default())?;
///
/// let store = SettingStore::new(StoreConfig::builder("settings").build(), storage)?;
/// store.set("ui.theme", "dark")?;
/// assert!(store.contains("ui.theme"));
/// # Ok::<(), tabset::Error>(())
/// ```
pub struct SettingStore<S: StorageBackend = SqliteStorage> {
    /// Store definition (table, columns, classifier)
    pub(crate) config: StoreConfig,

    /// Backing database
    pub(crate) storage: S,

    /// Cached name → value mapping
    pub(crate) settings: RwLock<HashMap<String, SettingValue>>,

    /// Event manager for change callbacks
    pub(crate) events: Arc<EventManager>,
}

impl<S: StorageBackend> std::fmt::Debug for SettingStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: StorageBackend> SettingStore<S> {
    /// Create a store and load its table.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or the load query fails.
    pub fn new(config: StoreConfig, storage: S) -> Result<Self> {
        let store = Self::unloaded(config, storage)?;
        let loaded = store.import_table(&store.config.table, |_| {})?;

        info!(
            "Loaded {loaded} settings rows from '{}' ({})",
            store.config.table,
            store.storage.backend_name()
        );
        Ok(store)
    }

    /// Validated store with an empty mapping
    pub(crate) fn unloaded(config: StoreConfig, storage: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            storage,
            settings: RwLock::new(HashMap::new()),
            events: Arc::new(EventManager::new()),
        })
    }

    /// Get the store definition
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get the event manager for registering change listeners
    ///
    /// # Example
    ///
    /// ```rust
    /// # use tabset::{SettingStore, SqliteStorage, StoreConfig, TableColumns};
    /// # let storage = SqliteStorage::in_memory()?;
    /// # storage.ensure_table("settings", &TableColumns::default())?;
    /// # let store = SettingStore::new(StoreConfig::builder("settings").build(), storage)?;
    /// store.events().watch("ui.theme", |name, _old, new| {
    ///     println!("{name} is now {new:?}");
    /// });
    /// # Ok::<(), tabset::Error>(())
    /// ```
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// Number of cached setting names
    pub fn len(&self) -> usize {
        self.settings.read_recovered().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether no setting name is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every row of `table` into the mapping.
    ///
    /// `on_record` sees each accepted record before it is merged. Returns the
    /// number of records merged.
    pub(crate) fn import_table<F>(&self, table: &str, on_record: F) -> Result<usize>
    where
        F: FnMut(&SettingRecord),
    {
        let records = self.fetch_records(table, &[])?;
        let mut settings = self.settings.write_recovered()?;
        Ok(self.merge_records(&mut settings, records, on_record))
    }

    /// Select the distinct `(name, content, multiple)` triples of `table`,
    /// restricted to `names` unless empty.
    pub(crate) fn fetch_records(&self, table: &str, names: &[&str]) -> Result<Vec<SettingRecord>> {
        let columns = &self.config.columns;
        let mut query = format!(
            "SELECT DISTINCT {name}, {content}, {multiple} FROM {table}",
            name = columns.name,
            content = columns.content,
            multiple = columns.multiple,
        );

        if !names.is_empty() {
            let placeholders = vec!["?"; names.len()].join(", ");
            query = format!("{query} WHERE {} IN ({placeholders})", columns.name);
        }
        let params: Vec<Value> = names.iter().map(|name| Value::from(*name)).collect();

        let rows = self.storage.select(&query, &params)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| self.record_from_row(row))
            .collect())
    }

    /// Rows without a usable name are skipped
    fn record_from_row(&self, mut row: Row) -> Option<SettingRecord> {
        let columns = &self.config.columns;
        let name = match row.remove(&columns.name)? {
            Value::String(name) if !name.is_empty() => name,
            Value::Number(number) => number.to_string(),
            _ => return None,
        };

        Some(SettingRecord {
            name,
            content: row.remove(&columns.content).unwrap_or(Value::Null),
            multiple: row.remove(&columns.multiple).unwrap_or(Value::Null),
        })
    }

    pub(crate) fn merge_records<F>(
        &self,
        settings: &mut HashMap<String, SettingValue>,
        records: Vec<SettingRecord>,
        mut on_record: F,
    ) -> usize
    where
        F: FnMut(&SettingRecord),
    {
        let mut merged = 0;
        for record in records {
            on_record(&record);
            let multiple = self.config.classifier.is_multiple(&record);

            if !multiple {
                settings.insert(record.name, SettingValue::Single(record.content));
            } else {
                match settings.entry(record.name) {
                    Entry::Occupied(mut entry) => {
                        if let SettingValue::Multiple(values) = entry.get_mut() {
                            values.push(record.content);
                        } else {
                            if !entry.get().is_null() {
                                warn!(
                                    "Multiple row for '{}' replaces its single value",
                                    entry.key()
                                );
                            }
                            entry.insert(SettingValue::Multiple(vec![record.content]));
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(SettingValue::Multiple(vec![record.content]));
                    }
                }
            }
            merged += 1;
        }
        merged
    }
}
