use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single field value on a news record. Records are flat: no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// String form used by token substitution and `=`/`!=` conditions.
    /// Booleans follow the CMS convention: true is "1", false is empty.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(true) => "1".to_string(),
            FieldValue::Bool(false) => String::new(),
        }
    }

    /// Truthiness for bare `{if field}` checks.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => {
                if s.is_empty() || s == "0" || s == "false" {
                    return false;
                }
                // Numeric zero in any spelling ("0.0", "00", "-0") is falsy
                !matches!(s.trim().parse::<f64>(), Ok(n) if n == 0.0)
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// One post's rendering-relevant field values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy for tests and sample data.
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<FieldValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Stringified value, empty when the field is absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(FieldValue::as_text).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_stringification() {
        assert_eq!(FieldValue::Bool(true).as_text(), "1");
        assert_eq!(FieldValue::Bool(false).as_text(), "");
    }

    #[test]
    fn test_truthiness() {
        for falsy in ["", "0", "false", "0.0", "00"] {
            assert!(!FieldValue::from(falsy).is_truthy(), "{:?} should be falsy", falsy);
        }
        for truthy in ["1", "yes", "False", " ", "0a"] {
            assert!(FieldValue::from(truthy).is_truthy(), "{:?} should be truthy", truthy);
        }
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(FieldValue::Bool(true).is_truthy());
    }

    #[test]
    fn test_record_deserializes_from_flat_json() {
        let rec: Record =
            serde_json::from_str(r#"{"title":"Hello","pinned":true,"andw_color":"red"}"#).unwrap();
        assert_eq!(rec.text("title"), "Hello");
        assert_eq!(rec.get("pinned"), Some(&FieldValue::Bool(true)));
        assert_eq!(rec.text("missing"), "");
    }
}
