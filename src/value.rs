//! In-memory setting values

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value held for a setting name: one content value, or the ordered
/// contents of every row flagged multiple.
///
/// Serializes as plain JSON: a collection is an array, a single value is
/// itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Multiple(Vec<Value>),
    Single(Value),
}

impl SettingValue {
    /// Returns the single value, if this is not a collection
    #[must_use]
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            SettingValue::Single(value) => Some(value),
            SettingValue::Multiple(_) => None,
        }
    }

    /// Returns the collected values, if this is a collection
    #[must_use]
    pub fn as_multiple(&self) -> Option<&[Value]> {
        match self {
            SettingValue::Single(_) => None,
            SettingValue::Multiple(values) => Some(values),
        }
    }

    #[must_use]
    pub fn is_multiple(&self) -> bool {
        matches!(self, SettingValue::Multiple(_))
    }

    /// A single `null` is treated like an absent setting on reads
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SettingValue::Single(Value::Null))
    }

    /// Convert into a JSON value (collections become arrays)
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Single(value) => value.clone(),
            SettingValue::Multiple(values) => Value::Array(values.clone()),
        }
    }

    /// Deserialize into a concrete type
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the value does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(|e| Error::Parse(e.to_string()))
    }
}

impl From<Value> for SettingValue {
    fn from(value: Value) -> Self {
        SettingValue::Single(value)
    }
}

impl From<Vec<Value>> for SettingValue {
    fn from(values: Vec<Value>) -> Self {
        SettingValue::Multiple(values)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Single(Value::from(value))
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Single(Value::from(value))
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Single(Value::from(value))
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Single(Value::from(value))
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Single(Value::from(value))
    }
}

/// Loose truthiness used for the `multiple` column.
///
/// Null, zero, `false`, the empty string, `"0"` and empty containers are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!([])));

        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(true)));
    }

    #[test]
    fn test_to_json_and_deserialize() {
        let multiple = SettingValue::Multiple(vec![json!("a"), json!("b")]);
        assert_eq!(multiple.to_json(), json!(["a", "b"]));

        let items: Vec<String> = multiple.deserialize().unwrap();
        assert_eq!(items, vec!["a", "b"]);

        let port = SettingValue::from(8080_i64);
        assert_eq!(port.deserialize::<u16>().unwrap(), 8080);
        assert!(port.deserialize::<String>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let hosts = SettingValue::Multiple(vec![json!("mx1"), json!("mx2")]);
        assert_eq!(serde_json::to_value(&hosts).unwrap(), json!(["mx1", "mx2"]));
        assert_eq!(serde_json::to_value(SettingValue::from(14_i64)).unwrap(), json!(14));

        // Arrays read back as collections, everything else as a single value
        let parsed: SettingValue = serde_json::from_str(r#"["mx1","mx2"]"#).unwrap();
        assert_eq!(parsed, hosts);
        let parsed: SettingValue = serde_json::from_str(r#""dark""#).unwrap();
        assert_eq!(parsed, SettingValue::from("dark"));
        let parsed: SettingValue = serde_json::from_str("null").unwrap();
        assert!(parsed.is_null());
    }

    #[test]
    fn test_null_single_counts_as_null() {
        assert!(SettingValue::Single(Value::Null).is_null());
        assert!(!SettingValue::Multiple(vec![]).is_null());
    }
}
