//! Error types for tabset

use std::fmt;
use thiserror::Error;

/// Result type alias for tabset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Mutating operation rejected on a protected setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadonlyOperation {
    /// `set_setting` on a protected name
    Change,
    /// `remove_setting` on a protected name
    Remove,
}

impl ReadonlyOperation {
    /// Numeric code carried by the error (401 for change, 402 for removal)
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            ReadonlyOperation::Change => 401,
            ReadonlyOperation::Remove => 402,
        }
    }
}

impl fmt::Display for ReadonlyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadonlyOperation::Change => f.write_str("change"),
            ReadonlyOperation::Remove => f.write_str("remove"),
        }
    }
}

/// Main error type for tabset
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Settings Errors
    // -------------------------------------------------------------------------
    #[error("Can not {operation} readonly setting '{name}'")]
    ReadonlySetting {
        name: String,
        operation: ReadonlyOperation,
    },

    #[error("Setting '{0}' holds a single value and can not take multiple values")]
    NotMultiple(String),

    #[error("Failed to parse setting value: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Settings store '{0}' not registered")]
    StoreNotRegistered(String),

    #[error("Settings store '{0}' already registered")]
    StoreAlreadyRegistered(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error rejected a change or removal of a protected setting
    #[must_use]
    pub fn is_readonly_violation(&self) -> bool {
        matches!(self, Error::ReadonlySetting { .. })
    }

    /// Check if this is a "not found" type error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::StoreNotRegistered(_))
    }

    /// Numeric code of a readonly violation (401 change, 402 remove)
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::ReadonlySetting { operation, .. } => Some(operation.code()),
            _ => None,
        }
    }

    /// Name of the setting the error is about, if any
    #[must_use]
    pub fn setting_name(&self) -> Option<&str> {
        match self {
            Error::ReadonlySetting { name, .. } | Error::NotMultiple(name) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn readonly(name: &str, operation: ReadonlyOperation) -> Self {
        Error::ReadonlySetting {
            name: name.to_string(),
            operation,
        }
    }
}
