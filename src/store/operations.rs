use super::core::SettingStore;
use super::{SetOptions, Settings};
use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::sync::RwLockExt;
use crate::value::{SettingValue, is_truthy};

use log::debug;
use serde_json::Value;
use std::collections::HashMap;

impl<S: StorageBackend> Settings for SettingStore<S> {
    fn get(&self, name: &str) -> Option<SettingValue> {
        self.settings
            .read_recovered()
            .ok()
            .and_then(|settings| settings.get(name).cloned())
    }

    fn set_setting(&self, name: &str, value: impl Into<Value>, options: SetOptions) -> Result<&Self> {
        let value = value.into();

        // Held across the statement so the mapping matches the table
        let mut settings = self.settings.write_recovered()?;
        let old = settings.get(name).cloned();

        let new = if options.multiple {
            match &old {
                None => SettingValue::Multiple(vec![value.clone()]),
                Some(SettingValue::Multiple(values)) => {
                    let mut values = values.clone();
                    values.push(value.clone());
                    SettingValue::Multiple(values)
                }
                Some(current) if current.is_null() => SettingValue::Multiple(vec![value.clone()]),
                Some(SettingValue::Single(_)) => return Err(Error::NotMultiple(name.to_string())),
            }
        } else {
            SettingValue::Single(value.clone())
        };

        if !options.temporary {
            self.persist(name, value, options.multiple)?;
        }
        settings.insert(name.to_string(), new.clone());
        drop(settings);

        debug!(
            "Set '{name}' in '{}' (multiple: {}, temporary: {})",
            self.config.table, options.multiple, options.temporary
        );
        self.events.notify(name, old.as_ref(), Some(&new));
        Ok(self)
    }

    fn remove_setting(&self, name: &str, temporary: bool) -> Result<&Self> {
        let mut settings = self.settings.write_recovered()?;
        if !temporary {
            let statement = format!(
                "DELETE FROM {} WHERE {} = ?",
                self.config.table, self.config.columns.name
            );
            self.storage.execute(&statement, &[Value::from(name)])?;
        }
        let old = settings.remove(name);
        drop(settings);

        debug!("Removed '{name}' from '{}' (temporary: {temporary})", self.config.table);
        if old.is_some() {
            self.events.notify(name, old.as_ref(), None);
        }
        Ok(self)
    }

    fn refresh_settings(&self, names: &[&str]) -> Result<&Self> {
        if names.is_empty() {
            return Ok(self);
        }

        // Held across the reload so no write lands between fetch and merge
        let mut settings = self.settings.write_recovered()?;
        let records = self.fetch_records(&self.config.table, names)?;
        for name in names {
            settings.remove(*name);
        }
        let merged = self.merge_records(&mut settings, records, |_| {});

        debug!(
            "Refreshed {} names ({merged} rows) from '{}'",
            names.len(),
            self.config.table
        );
        Ok(self)
    }

    fn settings(&self) -> HashMap<String, SettingValue> {
        self.settings
            .read_recovered()
            .map(|settings| settings.clone())
            .unwrap_or_default()
    }
}

impl<S: StorageBackend> SettingStore<S> {
    /// Write one change to the table.
    ///
    /// Multiple values always get a new row. A single value updates the row
    /// found by name, or inserts one if there is none.
    fn persist(&self, name: &str, value: Value, multiple: bool) -> Result<()> {
        let table = &self.config.table;
        let columns = &self.config.columns;
        let insert = format!(
            "INSERT INTO {table} ({}, {}, {}) VALUES (?, ?, ?)",
            columns.name, columns.content, columns.multiple
        );

        if multiple {
            self.storage
                .execute(&insert, &[Value::from(name), value, Value::from(1)])?;
            return Ok(());
        }

        let lookup = format!("SELECT {} FROM {table} WHERE {} = ?", columns.id, columns.name);
        let id = self
            .storage
            .select_field_value(&lookup, &columns.id, &[Value::from(name)])?
            .filter(is_truthy);

        match id {
            Some(id) => {
                let update = format!(
                    "UPDATE {table} SET {} = ? WHERE {} = ?",
                    columns.content, columns.id
                );
                self.storage.execute(&update, &[value, id])?;
            }
            None => {
                self.storage
                    .execute(&insert, &[Value::from(name), value, Value::from(0)])?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreConfig, TableColumns};
    use crate::storage::{Row, SqliteStorage};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Duration;

    /// Signals the first armed select and then stalls before returning rows
    #[derive(Clone)]
    struct StallingStorage {
        inner: SqliteStorage,
        on_select: Arc<Mutex<Option<mpsc::Sender<()>>>>,
    }

    impl StorageBackend for StallingStorage {
        fn backend_name(&self) -> &'static str {
            "stalling"
        }

        fn select(&self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
            let rows = self.inner.select(query, params)?;
            if let Some(tx) = self.on_select.lock().unwrap().take() {
                tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(rows)
        }

        fn execute(&self, statement: &str, params: &[Value]) -> Result<usize> {
            self.inner.execute(statement, params)
        }
    }

    fn storage() -> SqliteStorage {
        let storage = SqliteStorage::in_memory().unwrap();
        storage
            .ensure_table("settings", &TableColumns::default())
            .unwrap();
        storage
    }

    fn store(storage: &SqliteStorage) -> SettingStore {
        SettingStore::new(StoreConfig::builder("settings").build(), storage.clone()).unwrap()
    }

    fn row_count(storage: &SqliteStorage, name: &str) -> i64 {
        storage
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM settings WHERE name = ?1",
                    [name],
                    |row| row.get(0),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_single_update_reuses_row() {
        let storage = storage();
        let store = store(&storage);

        store.set("ui.theme", "dark").unwrap();
        store.set("ui.theme", "light").unwrap();

        assert_eq!(row_count(&storage, "ui.theme"), 1);
        assert_eq!(store.get("ui.theme"), Some(SettingValue::from("light")));

        let reloaded = self::store(&storage);
        assert_eq!(reloaded.get("ui.theme"), Some(SettingValue::from("light")));
    }

    #[test]
    fn test_append_to_null_single() {
        let storage = storage();
        let store = store(&storage);

        store.set_temporary("hosts", Value::Null).unwrap();
        store.append("hosts", "mx1").unwrap();

        assert_eq!(store.get("hosts"), Some(SettingValue::Multiple(vec![json!("mx1")])));
    }

    #[test]
    fn test_append_to_single_fails_without_change() {
        let storage = storage();
        let store = store(&storage);

        store.set("hosts", "mx1").unwrap();
        let err = store.append("hosts", "mx2").unwrap_err();

        assert!(matches!(err, Error::NotMultiple(ref name) if name == "hosts"));
        assert_eq!(store.get("hosts"), Some(SettingValue::from("mx1")));
        assert_eq!(row_count(&storage, "hosts"), 1);
    }

    #[test]
    fn test_single_replaces_collection() {
        let storage = storage();
        let store = store(&storage);

        store.append("hosts", "mx1").unwrap();
        store.set_temporary("hosts", "only").unwrap();
        assert_eq!(store.get("hosts"), Some(SettingValue::from("only")));
    }

    #[test]
    fn test_refresh_reloads_only_requested_names() {
        let storage = storage();
        let store = store(&storage);

        store.set_temporary("a", "memory").unwrap();
        store.set_temporary("b", "memory").unwrap();
        storage
            .execute(
                "INSERT INTO settings (name, content, multiple) VALUES (?, ?, 0)",
                &[json!("a"), json!("table")],
            )
            .unwrap();

        store.refresh_settings(&["a"]).unwrap();

        assert_eq!(store.get("a"), Some(SettingValue::from("table")));
        assert_eq!(store.get("b"), Some(SettingValue::from("memory")));
    }

    #[test]
    fn test_refresh_drops_names_missing_from_table() {
        let storage = storage();
        let store = store(&storage);

        store.set_temporary("ghost", "memory").unwrap();
        store.refresh_settings(&["ghost"]).unwrap();
        assert!(!store.contains("ghost"));

        // No-op on an empty list
        store.refresh_settings(&[]).unwrap();
    }

    #[test]
    fn test_set_during_refresh_is_not_overwritten() {
        let inner = storage();
        inner
            .execute(
                "INSERT INTO settings (name, content, multiple) VALUES (?, ?, 0)",
                &[json!("a"), json!("table")],
            )
            .unwrap();
        let storage = StallingStorage {
            inner,
            on_select: Arc::new(Mutex::new(None)),
        };
        let store =
            SettingStore::new(StoreConfig::builder("settings").build(), storage.clone()).unwrap();

        let (tx, rx) = mpsc::channel();
        *storage.on_select.lock().unwrap() = Some(tx);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                store.refresh_settings(&["a"]).unwrap();
            });
            // The refresh is now inside its select; this write waits for it
            rx.recv().unwrap();
            store.set_temporary("a", "writer").unwrap();
        });

        assert_eq!(store.get("a"), Some(SettingValue::from("writer")));
    }

    #[test]
    fn test_events_fire_after_writes() {
        let storage = storage();
        let store = store(&storage);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        store.events().watch("ui.theme", move |_name, _old, _new| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set("ui.theme", "dark").unwrap();
        store.remove("ui.theme").unwrap();
        // Removing an absent name does not notify
        store.remove("ui.theme").unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_settings_is_a_snapshot() {
        let storage = storage();
        let store = store(&storage);
        store.set("a", 1).unwrap();

        let mut snapshot = store.settings();
        snapshot.insert("b".into(), SettingValue::from(2_i64));

        assert!(!store.contains("b"));
        assert_eq!(store.len(), 1);
    }
}
