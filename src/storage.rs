//! Storage backend trait and implementations
//!
//! A settings store only needs three things from its relational database:
//! select rows, select a single field of the first row, and execute a
//! parameterized statement. Parameters and row values travel as JSON values.

mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// A selected row, keyed by column name
pub type Row = HashMap<String, Value>;

/// Trait for relational storage backends
///
/// Backends are cloned into every store created from a registry, so clones
/// must share the same underlying connection.
pub trait StorageBackend: Clone + Send + Sync {
    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;

    /// Run a query and return every row
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be prepared or executed.
    fn select(&self, query: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a query and return `field` from the first row, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be prepared or executed.
    fn select_field_value(&self, query: &str, field: &str, params: &[Value]) -> Result<Option<Value>> {
        let rows = self.select(query, params)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(field)))
    }

    /// Execute a statement and return the number of affected rows
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn execute(&self, statement: &str, params: &[Value]) -> Result<usize>;
}
