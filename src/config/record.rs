//! Loaded setting records and the multiple-value classifier

use crate::value::is_truthy;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One row returned by the settings load query
#[derive(Debug, Clone, PartialEq)]
pub struct SettingRecord {
    /// Setting name (never empty)
    pub name: String,
    /// Raw content column
    pub content: Value,
    /// Raw `multiple` column
    pub multiple: Value,
}

impl SettingRecord {
    /// Whether the row's `multiple` flag is truthy
    #[must_use]
    pub fn is_flagged_multiple(&self) -> bool {
        is_truthy(&self.multiple)
    }
}

/// Decides whether a loaded record accumulates into a collection
#[derive(Clone)]
pub struct RecordClassifier(Arc<dyn Fn(&SettingRecord) -> bool + Send + Sync>);

impl RecordClassifier {
    /// Wrap a custom predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&SettingRecord) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Classify a record
    #[must_use]
    pub fn is_multiple(&self, record: &SettingRecord) -> bool {
        (self.0)(record)
    }
}

impl Default for RecordClassifier {
    /// Uses the row's `multiple` flag
    fn default() -> Self {
        Self::new(SettingRecord::is_flagged_multiple)
    }
}

impl fmt::Debug for RecordClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordClassifier(Fn)")
    }
}
