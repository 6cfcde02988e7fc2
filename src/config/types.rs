//! Store definitions and table layout

use super::record::{RecordClassifier, SettingRecord};
use crate::error::{Error, Result};

use regex::Regex;
use std::sync::OnceLock;

/// Validate a table or column name before it is interpolated into SQL.
///
/// Accepts plain identifiers and one level of schema qualification
/// (`main.settings`).
///
/// # Errors
///
/// Returns `Error::InvalidIdentifier` if the name does not match.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let pattern = IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier pattern is valid")
    });

    if pattern.is_match(identifier) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(identifier.to_string()))
    }
}

/// Column names of a settings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub id: String,
    pub name: String,
    pub content: String,
    pub multiple: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            name: "name".into(),
            content: "content".into(),
            multiple: "multiple".into(),
        }
    }
}

impl TableColumns {
    /// Check every column name
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` for the first bad column name.
    /// Column names may not be qualified.
    pub fn validate(&self) -> Result<()> {
        for column in [&self.id, &self.name, &self.content, &self.multiple] {
            validate_identifier(column)?;
            if column.contains('.') {
                return Err(Error::InvalidIdentifier(column.clone()));
            }
        }
        Ok(())
    }
}

/// Definition of one settings store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Registry key (defaults to the table name)
    pub name: String,

    /// Mutable settings table
    pub table: String,

    /// Table whose names are protected from change and removal
    pub readonly_table: Option<String>,

    /// Column layout shared by both tables
    pub columns: TableColumns,

    /// Multiple-value policy applied to each loaded row
    pub classifier: RecordClassifier,
}

impl StoreConfig {
    /// Create a new builder for a store over `table`
    ///
    /// # Example
    /// ```rust
    /// use tabset::StoreConfig;
    ///
    /// let config = StoreConfig::builder("app_settings")
    ///     .readonly_table("app_settings_locked")
    ///     .build();
    /// assert_eq!(config.name, "app_settings");
    /// ```
    pub fn builder(table: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(table)
    }

    /// Whether stores built from this definition enforce a read-only table
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly_table.is_some()
    }

    /// Check that every table and column name is a safe SQL identifier
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` on the first bad name, or
    /// `Error::Config` if the read-only table is the mutable table.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.table)?;
        if let Some(readonly) = &self.readonly_table {
            validate_identifier(readonly)?;
            if readonly == &self.table {
                return Err(Error::Config(format!(
                    "Read-only table '{readonly}' must differ from the settings table"
                )));
            }
        }
        self.columns.validate()
    }
}

/// Builder for creating a [`StoreConfig`] with a fluent API
#[derive(Debug, Clone)]
pub struct StoreConfigBuilder {
    name: Option<String>,
    table: String,
    readonly_table: Option<String>,
    columns: TableColumns,
    classifier: RecordClassifier,
}

impl StoreConfigBuilder {
    /// Create a new builder with the required table name
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            name: None,
            table: table.into(),
            readonly_table: None,
            columns: TableColumns::default(),
            classifier: RecordClassifier::default(),
        }
    }

    /// Set the registry key (default: the table name)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Load protected settings from a second table
    pub fn readonly_table(mut self, table: impl Into<String>) -> Self {
        self.readonly_table = Some(table.into());
        self
    }

    /// Replace the whole column layout
    pub fn columns(mut self, columns: TableColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.columns.id = column.into();
        self
    }

    pub fn name_column(mut self, column: impl Into<String>) -> Self {
        self.columns.name = column.into();
        self
    }

    pub fn content_column(mut self, column: impl Into<String>) -> Self {
        self.columns.content = column.into();
        self
    }

    pub fn multiple_column(mut self, column: impl Into<String>) -> Self {
        self.columns.multiple = column.into();
        self
    }

    /// Decide per loaded row whether it belongs to a multi-valued setting.
    ///
    /// The default reads the row's `multiple` flag.
    ///
    /// # Example
    /// ```rust
    /// use tabset::StoreConfig;
    ///
    /// let config = StoreConfig::builder("settings")
    ///     .classifier(|record| record.name.starts_with("list."))
    ///     .build();
    /// ```
    pub fn classifier<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SettingRecord) -> bool + Send + Sync + 'static,
    {
        self.classifier = RecordClassifier::new(predicate);
        self
    }

    /// Build the store definition
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            name: self.name.unwrap_or_else(|| self.table.clone()),
            table: self.table,
            readonly_table: self.readonly_table,
            columns: self.columns,
            classifier: self.classifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("settings").is_ok());
        assert!(validate_identifier("_tbl2").is_ok());
        assert!(validate_identifier("main.settings").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("name; DROP TABLE settings").is_err());
        assert!(validate_identifier("na-me").is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = StoreConfig::builder("settings").build();
        assert_eq!(config.name, "settings");
        assert_eq!(config.columns, TableColumns::default());
        assert!(!config.is_readonly());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::builder("settings")
            .name("main")
            .readonly_table("settings_locked")
            .name_column("setting_key")
            .content_column("setting_value")
            .build();

        assert_eq!(config.name, "main");
        assert!(config.is_readonly());
        assert_eq!(config.columns.name, "setting_key");
        assert_eq!(config.columns.content, "setting_value");
        assert_eq!(config.columns.id, "id");
    }

    #[test]
    fn test_validate_rejects_same_tables() {
        let config = StoreConfig::builder("settings")
            .readonly_table("settings")
            .build();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_column() {
        let config = StoreConfig::builder("settings")
            .multiple_column("multi ple")
            .build();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidIdentifier(col)) if col == "multi ple"
        ));
    }
}
