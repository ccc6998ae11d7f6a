//! Atomic field descriptors: bool, int, float and string values.

use regex::Regex;
use serde_json::Value as Json;

use crate::impl_field;
use crate::instance::value::{json_scalar_repr, Value};
use crate::schema::types::field::common::FieldCommon;

/// Boolean value, accepting booleans, 0/1 integers or true/yes/false/no
/// strings.
#[derive(Debug, Clone)]
pub struct BoolField {
    pub inner: FieldCommon,
}

impl_field!(BoolField);

impl BoolField {
    pub(crate) fn coerce(&self, value: &Json) -> Result<Value, String> {
        match value {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::String(s) => match s.as_str() {
                "true" | "True" | "yes" | "Yes" => Ok(Value::Bool(true)),
                "false" | "False" | "no" | "No" => Ok(Value::Bool(false)),
                _ => Err(bool_error()),
            },
            Json::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(bool_error()),
            },
            _ => Err(bool_error()),
        }
    }
}

fn bool_error() -> String {
    "Value must be a boolean or a true/false/yes/no string value".to_string()
}

/// Integer value, accepting integers, whole floats or strings holding an
/// integer.
#[derive(Debug, Clone)]
pub struct IntField {
    pub inner: FieldCommon,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl_field!(IntField);

impl IntField {
    pub(crate) fn coerce(&self, value: &Json) -> Result<Value, String> {
        match value {
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 {
                        Ok(Value::Int(f as i64))
                    } else {
                        Err(format!("Numeric value {} is not an integer", f))
                    }
                } else {
                    Err(format!("Value {} is not an integer number", n))
                }
            }
            Json::String(s) => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("Value '{}' is not an integer number", s)),
            other => Err(format!(
                "Value {} is not an integer number",
                json_scalar_repr(other)
            )),
        }
    }

    pub(crate) fn rule_messages(&self, value: i64) -> Vec<String> {
        number_rule_messages(
            value as f64,
            self.min_value.map(|m| m.to_string()),
            self.max_value.map(|m| m.to_string()),
            self.min_value.map(|m| m as f64),
            self.max_value.map(|m| m as f64),
        )
    }
}

/// Floating point value, accepting floats, integers or strings holding a
/// number.
#[derive(Debug, Clone)]
pub struct FloatField {
    pub inner: FieldCommon,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl_field!(FloatField);

impl FloatField {
    pub(crate) fn coerce(&self, value: &Json) -> Result<Value, String> {
        match value {
            Json::Number(n) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("Value {} is not a floating point number", n)),
            Json::String(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("Value '{}' is not a floating point number", s)),
            other => Err(format!(
                "Value {} is not a floating point number",
                json_scalar_repr(other)
            )),
        }
    }

    pub(crate) fn rule_messages(&self, value: f64) -> Vec<String> {
        number_rule_messages(
            value,
            self.min_value.map(fmt_float),
            self.max_value.map(fmt_float),
            self.min_value,
            self.max_value,
        )
    }
}

/// Renders a float the way validation messages expect: integral values keep
/// a trailing `.0`.
pub(crate) fn fmt_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn number_rule_messages(
    value: f64,
    min_repr: Option<String>,
    max_repr: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
) -> Vec<String> {
    match (min, max) {
        (Some(lo), Some(hi)) => {
            if value < lo || value > hi {
                vec![format!(
                    "Must be between {} and {}",
                    min_repr.unwrap_or_default(),
                    max_repr.unwrap_or_default()
                )]
            } else {
                Vec::new()
            }
        }
        (Some(lo), None) if value < lo => {
            vec![format!("Must be at least {}", min_repr.unwrap_or_default())]
        }
        (None, Some(hi)) if value > hi => {
            vec![format!("Must be at most {}", max_repr.unwrap_or_default())]
        }
        _ => Vec::new(),
    }
}

/// String value, accepting strings or scalars coercible to their canonical
/// string form.
#[derive(Debug, Clone)]
pub struct StrField {
    pub inner: FieldCommon,
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub choices: Option<Vec<String>>,
    pub pattern: Option<Regex>,
}

impl_field!(StrField);

impl StrField {
    pub(crate) fn coerce(&self, value: &Json) -> Result<Value, String> {
        match value {
            Json::String(s) => Ok(Value::Str(s.clone())),
            Json::Bool(b) => Ok(Value::Str(b.to_string())),
            Json::Number(n) => Ok(Value::Str(n.to_string())),
            _ => Err("Value must be a string or a scalar value".to_string()),
        }
    }

    pub(crate) fn rule_messages(&self, value: &str) -> Vec<String> {
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|choice| choice == value) {
                return vec![format!("Must be one of: {}", choices.join(", "))];
            }
            return Vec::new();
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                let case = if pattern.as_str().starts_with("(?i") {
                    " (case insensitive)"
                } else {
                    ""
                };
                return vec![format!("Must match regex `{}`{}", pattern.as_str(), case)];
            }
            return Vec::new();
        }

        let length = value.chars().count();
        match (self.min_length, self.max_length) {
            (min, Some(max)) if min > 0 => {
                if length < min || length > max {
                    if min == max {
                        vec![format!(
                            "Must be exactly {} character{} long",
                            min,
                            plural(min)
                        )]
                    } else {
                        vec![format!("Must be {} to {} characters long", min, max)]
                    }
                } else {
                    Vec::new()
                }
            }
            (1, None) if length == 0 => vec!["This value cannot be empty".to_string()],
            (min, None) if min > 1 && length < min => {
                vec![format!("Must be at least {} characters long", min)]
            }
            (0, Some(max)) if length > max => {
                vec![format!(
                    "Must be at most {} character{} long",
                    max,
                    plural(max)
                )]
            }
            _ => Vec::new(),
        }
    }
}

pub(crate) fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bool_field() -> BoolField {
        BoolField {
            inner: FieldCommon::new("flag"),
        }
    }

    fn int_field(min: Option<i64>, max: Option<i64>) -> IntField {
        IntField {
            inner: FieldCommon::new("count"),
            min_value: min,
            max_value: max,
        }
    }

    fn float_field(min: Option<f64>, max: Option<f64>) -> FloatField {
        FloatField {
            inner: FieldCommon::new("ratio"),
            min_value: min,
            max_value: max,
        }
    }

    fn str_field() -> StrField {
        StrField {
            inner: FieldCommon::new("label"),
            min_length: 0,
            max_length: None,
            choices: None,
            pattern: None,
        }
    }

    #[test]
    fn test_bool_coercion_accepts_yes_no_strings() {
        let field = bool_field();
        assert_eq!(field.coerce(&json!(true)), Ok(Value::Bool(true)));
        assert_eq!(field.coerce(&json!("yes")), Ok(Value::Bool(true)));
        assert_eq!(field.coerce(&json!("True")), Ok(Value::Bool(true)));
        assert_eq!(field.coerce(&json!("no")), Ok(Value::Bool(false)));
        assert_eq!(field.coerce(&json!(0)), Ok(Value::Bool(false)));
        assert!(field.coerce(&json!("maybe")).is_err());
        assert!(field.coerce(&json!(2)).is_err());
    }

    #[test]
    fn test_int_coercion_widens_and_parses() {
        let field = int_field(None, None);
        assert_eq!(field.coerce(&json!(10)), Ok(Value::Int(10)));
        assert_eq!(field.coerce(&json!(10.0)), Ok(Value::Int(10)));
        assert_eq!(field.coerce(&json!("10")), Ok(Value::Int(10)));
        assert_eq!(
            field.coerce(&json!(10.5)),
            Err("Numeric value 10.5 is not an integer".to_string())
        );
        assert_eq!(
            field.coerce(&json!("10x")),
            Err("Value '10x' is not an integer number".to_string())
        );
    }

    #[test]
    fn test_float_coercion_widens_integers() {
        let field = float_field(None, None);
        assert_eq!(field.coerce(&json!(10)), Ok(Value::Float(10.0)));
        assert_eq!(field.coerce(&json!("10")), Ok(Value::Float(10.0)));
        assert!(field.coerce(&json!("ten")).is_err());
    }

    #[test]
    fn test_number_rules_render_bounds() {
        let field = float_field(Some(42.0), None);
        assert_eq!(field.rule_messages(10.0), vec!["Must be at least 42.0"]);
        assert!(field.rule_messages(42.0).is_empty());

        let field = int_field(Some(1), Some(5));
        assert_eq!(field.rule_messages(9), vec!["Must be between 1 and 5"]);

        let field = int_field(None, Some(5));
        assert_eq!(field.rule_messages(9), vec!["Must be at most 5"]);
    }

    #[test]
    fn test_str_rules() {
        let mut field = str_field();
        field.min_length = 1;
        assert_eq!(field.rule_messages(""), vec!["This value cannot be empty"]);
        assert!(field.rule_messages("x").is_empty());

        let mut field = str_field();
        field.min_length = 2;
        field.max_length = Some(2);
        assert_eq!(
            field.rule_messages("abc"),
            vec!["Must be exactly 2 characters long"]
        );

        let mut field = str_field();
        field.choices = Some(vec!["red".into(), "blue".into()]);
        assert_eq!(
            field.rule_messages("green"),
            vec!["Must be one of: red, blue"]
        );

        let mut field = str_field();
        field.pattern = Some(Regex::new("^[a-z]+$").unwrap());
        assert_eq!(
            field.rule_messages("X"),
            vec!["Must match regex `^[a-z]+$`"]
        );
    }

    #[test]
    fn test_fmt_float_keeps_trailing_zero() {
        assert_eq!(fmt_float(42.0), "42.0");
        assert_eq!(fmt_float(0.5), "0.5");
    }
}
