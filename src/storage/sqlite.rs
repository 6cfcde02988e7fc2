//! SQLite storage backend

use super::{Row, StorageBackend};
use crate::config::{TableColumns, validate_identifier};
use crate::error::Result;
use crate::sync::MutexExt;

use log::{debug, info};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// SQLite-backed settings storage.
///
/// Clones share one connection; statements are serialized by its mutex.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    ///
    /// Supports `~` expansion for home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_home(path.as_ref());
        let conn = Connection::open(&path)?;
        info!("Opened SQLite settings database at: {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails to allocate the database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an already configured connection
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a closure against the raw connection
    ///
    /// # Errors
    ///
    /// Returns any error produced by the closure.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock_recovered()?;
        Ok(f(&*conn)?)
    }

    /// Create a settings table with the given column layout if it is missing.
    ///
    /// The content column is declared without a type so SQLite keeps the
    /// storage class of each written value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` for a bad table or column name, or a
    /// database error if the statement fails.
    pub fn ensure_table(&self, table: &str, columns: &TableColumns) -> Result<()> {
        validate_identifier(table)?;
        columns.validate()?;

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT,
                {name} TEXT NOT NULL,
                {content},
                {multiple} INTEGER NOT NULL DEFAULT 0
            )",
            id = columns.id,
            name = columns.name,
            content = columns.content,
            multiple = columns.multiple,
        );
        self.with_connection(|conn| conn.execute_batch(&sql))?;
        debug!("Ensured settings table '{table}'");
        Ok(())
    }
}

impl StorageBackend for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn select(&self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.conn.lock_recovered()?;
        let mut stmt = conn.prepare(query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter().map(to_sql)))?;
        let mut selected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), from_sql(row.get_ref(idx)?));
            }
            selected.push(record);
        }
        Ok(selected)
    }

    fn execute(&self, statement: &str, params: &[Value]) -> Result<usize> {
        let conn = self.conn.lock_recovered()?;
        Ok(conn.execute(statement, params_from_iter(params.iter().map(to_sql)))?)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}

/// Convert a JSON parameter into an SQLite value
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        // Containers are kept as their JSON text
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert a selected SQLite value into JSON
fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => from_bytes(bytes),
    }
}

/// UTF-8 bytes become a string, anything else the array of raw bytes
fn from_bytes(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
