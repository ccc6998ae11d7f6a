//! Runtime representation of converted field values.
//!
//! Conversion turns raw `serde_json::Value` input into `Value`s according to
//! the field descriptors of a schema. `Value::Missing` is the sentinel for a
//! required field that was absent from input (or failed coercion); reading
//! such a field never panics, it simply yields `Missing`.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::instance::ModelInstance;

/// A typed field value held by a [`ModelInstance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Required field that was absent from input or never assigned.
    Missing,
    /// Explicit null. Only legal for fields declared `allow_none`.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// String-keyed mapping; insertion order is preserved.
    Map(IndexMap<String, Value>),
    /// A converted nested structure.
    Model(ModelInstance),
    /// Free-form value kept as raw primitive data.
    Any(Json),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<ModelInstance> for Value {
    fn from(v: ModelInstance) -> Self {
        Value::Model(v)
    }
}

/// Short type name of a primitive value, used in conversion error messages.
pub(crate) fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "int",
        Json::String(_) => "str",
        Json::Array(_) => "list",
        Json::Object(_) => "dict",
    }
}

/// Render a scalar for error messages, quoting strings.
pub(crate) fn json_scalar_repr(value: &Json) -> String {
    match value {
        Json::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variants() {
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Int(3).as_float(), None);
        assert_eq!(Value::Str("a".into()).as_str(), Some("a"));
        assert!(Value::Missing.is_missing());
        assert!(!Value::Null.is_missing());
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&serde_json::json!(1)), "int");
        assert_eq!(json_type_name(&serde_json::json!(1.5)), "float");
        assert_eq!(json_type_name(&serde_json::json!("x")), "str");
        assert_eq!(json_type_name(&serde_json::json!([])), "list");
        assert_eq!(json_type_name(&serde_json::json!({})), "dict");
        assert_eq!(json_type_name(&serde_json::Value::Null), "null");
    }

    #[test]
    fn test_scalar_repr_quotes_strings() {
        assert_eq!(json_scalar_repr(&serde_json::json!("10x")), "'10x'");
        assert_eq!(json_scalar_repr(&serde_json::json!(10.5)), "10.5");
    }
}
