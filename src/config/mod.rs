//! Store configuration types
//!
//! This module contains the definition types for settings stores:
//! - `StoreConfig` - Table, optional read-only table, columns and classifier
//! - `TableColumns` - Column names of a settings table
//! - `SettingRecord` / `RecordClassifier` - Multiple-value policy for loaded rows

mod record;
mod types;

pub use record::{RecordClassifier, SettingRecord};
pub use types::{StoreConfig, StoreConfigBuilder, TableColumns, validate_identifier};
