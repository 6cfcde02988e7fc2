//! Common test utilities for tabset integration tests
//!
//! Provides an in-memory database with the conventional tables and a storage
//! wrapper whose writes can be made to fail.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabset::{
    Error, ReadonlySettingStore, Result, Row, SettingStore, SqliteStorage, StorageBackend,
    StoreConfig, TableColumns,
};

pub const TABLE: &str = "settings";
pub const READONLY_TABLE: &str = "settings_locked";

// =============================================================================
// Test Fixtures
// =============================================================================

/// In-memory database with both settings tables created
pub struct TestDb {
    pub storage: SqliteStorage,
}

impl TestDb {
    pub fn new() -> Self {
        let storage = SqliteStorage::in_memory().expect("Failed to open in-memory database");
        for table in [TABLE, READONLY_TABLE] {
            storage
                .ensure_table(table, &TableColumns::default())
                .expect("Failed to create settings table");
        }
        Self { storage }
    }

    /// Insert a raw row, bypassing any store
    pub fn insert(&self, table: &str, name: &str, content: Value, multiple: bool) {
        self.storage
            .execute(
                &format!("INSERT INTO {table} (name, content, multiple) VALUES (?, ?, ?)"),
                &[json!(name), content, json!(multiple)],
            )
            .expect("Failed to insert row");
    }

    /// All `(content, multiple)` rows stored for `name`, in insertion order
    pub fn rows(&self, table: &str, name: &str) -> Vec<(Value, Value)> {
        self.storage
            .select(
                &format!("SELECT content, multiple FROM {table} WHERE name = ? ORDER BY id"),
                &[json!(name)],
            )
            .expect("Failed to select rows")
            .into_iter()
            .map(|mut row| (take(&mut row, "content"), take(&mut row, "multiple")))
            .collect()
    }

    pub fn count(&self, table: &str) -> usize {
        self.storage
            .select(&format!("SELECT id FROM {table}"), &[])
            .expect("Failed to count rows")
            .len()
    }

    pub fn store(&self) -> SettingStore {
        SettingStore::new(StoreConfig::builder(TABLE).build(), self.storage.clone())
            .expect("Failed to create store")
    }

    pub fn readonly_store(&self) -> ReadonlySettingStore {
        let config = StoreConfig::builder(TABLE)
            .readonly_table(READONLY_TABLE)
            .build();
        ReadonlySettingStore::new(config, self.storage.clone())
            .expect("Failed to create read-only store")
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

fn take(row: &mut Row, column: &str) -> Value {
    row.remove(column).unwrap_or(Value::Null)
}

// =============================================================================
// Failing Storage
// =============================================================================

/// SQLite storage whose statements fail on demand
#[derive(Clone)]
pub struct FlakyStorage {
    inner: SqliteStorage,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn new(inner: SqliteStorage) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for FlakyStorage {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    fn select(&self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.inner.select(query, params)
    }

    fn execute(&self, statement: &str, params: &[Value]) -> Result<usize> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("database is locked".into()));
        }
        self.inner.execute(statement, params)
    }
}
