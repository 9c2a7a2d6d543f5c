//! Runtime value types for lead field data
//!
//! The `Value` enum represents all possible values a lead field can carry,
//! similar to JSON values. Condition operators coerce through the helper
//! methods here rather than failing on mixed types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lead field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (f64 for simplicity, handles both int and float)
    Number(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object (key-value map)
    Object(HashMap<String, Value>),
}

impl Value {
    /// Numeric coercion: numbers pass through, numeric strings parse,
    /// everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Stringify for the text operators. Arrays and objects have no
    /// useful text form and yield `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Emptiness as the routing engine defines it: null or empty string.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number_coercion() {
        assert_eq!(Value::Number(15000.0).as_number(), Some(15000.0));
        assert_eq!(Value::String("42".to_string()).as_number(), Some(42.0));
        assert_eq!(Value::String(" 3.5 ".to_string()).as_number(), Some(3.5));
        assert_eq!(Value::String("abc".to_string()).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(
            Value::String("Acme".to_string()).as_text(),
            Some("Acme".to_string())
        );
        assert_eq!(Value::Number(10.0).as_text(), Some("10".to_string()));
        assert_eq!(Value::Bool(false).as_text(), Some("false".to_string()));
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::Array(vec![]).as_text(), None);
    }

    #[test]
    fn test_is_empty_value() {
        assert!(Value::Null.is_empty_value());
        assert!(Value::String(String::new()).is_empty_value());
        assert!(!Value::String("x".to_string()).is_empty_value());
        assert!(!Value::Number(0.0).is_empty_value());
        assert!(!Value::Bool(false).is_empty_value());
    }

    #[test]
    fn test_value_serde_json() {
        let val = Value::Object({
            let mut map = HashMap::new();
            map.insert("deal_value".to_string(), Value::Number(15000.0));
            map.insert("source".to_string(), Value::String("web".to_string()));
            map
        });

        let json = serde_json::to_string(&val).unwrap();
        let deserialized: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, deserialized);
    }
}
