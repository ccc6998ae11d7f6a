//! Runtime instances of structure types.
//!
//! This module contains the converted, strongly-typed side of the engine:
//! - [`Value`]: typed field values including the `Missing` sentinel
//! - [`ModelInstance`]: a mutable bag of field values backed by its schema
//! - the conversion, validation and serialization engines

pub mod convert;
pub mod serialize;
pub mod validate;
pub mod value;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::schema::roles::{Role, DEFAULT_ROLE};
use crate::schema::types::errors::{ErrorTree, SchemaError, ValidationError};
use crate::schema::types::field::ValidationContext;
use crate::schema::types::schema::Schema;

pub use value::Value;

/// A converted instance of a structure type: field values keyed by field
/// name, backed by the compiled schema.
///
/// Instances are created by conversion or
/// [`SchemaRegistry::new_instance`](crate::schema::registry::SchemaRegistry::new_instance)
/// and mutated freely through [`set`](Self::set). They are not thread-safe
/// for concurrent mutation; concurrent reads are fine. Cloning produces an
/// independent deep copy.
#[derive(Clone)]
pub struct ModelInstance {
    pub(crate) schema: Arc<Schema>,
    pub(crate) values: IndexMap<String, Value>,
}

impl ModelInstance {
    pub(crate) fn from_parts(schema: Arc<Schema>, values: IndexMap<String, Value>) -> Self {
        Self { schema, values }
    }

    /// The compiled schema backing this instance.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Name of the structure type.
    pub fn schema_name(&self) -> &str {
        &self.schema.name
    }

    /// Value of a field. Returns `Value::Missing` for required fields that
    /// were absent from input — reading never panics. `None` only for
    /// names that are not fields of this type (or computed fields, which
    /// hold no stored value).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets a field value. Unknown names and computed fields are rejected;
    /// values are not re-coerced, the caller provides typed values.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        match self.schema.fields.get(name) {
            None => Err(SchemaError::InvalidField(format!(
                "Field {} not found in schema {}",
                name, self.schema.name
            ))),
            Some(field) if field.is_serializable() => Err(SchemaError::InvalidField(format!(
                "Field {} of schema {} is serializable and cannot be assigned",
                name, self.schema.name
            ))),
            Some(_) => {
                self.values.insert(name.to_string(), value.into());
                Ok(())
            }
        }
    }

    /// Iterates over (field name, value) pairs, skipping `Missing` fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .filter(|(_, value)| !value.is_missing())
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Runs the validation pass and returns the error tree; empty means
    /// valid. Idempotent and re-runnable, never mutates the instance.
    pub fn validation_errors(&self, context: ValidationContext) -> ErrorTree {
        ErrorTree::from_path_errors(&validate::validation_errors(self, context))
    }

    /// Validates the instance, failing if any error was found.
    pub fn validate(&self, context: ValidationContext) -> Result<(), ValidationError> {
        let errors = validate::validation_errors(self, context);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }

    /// Serializes the instance to primitive data under the given role.
    pub fn to_primitive(&self, role: Role) -> Json {
        serialize::to_primitive(self, role)
    }

    /// Serializes the instance under the default role.
    pub fn serialize(&self) -> Json {
        self.to_primitive(DEFAULT_ROLE)
    }
}

impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.values == other.values
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("schema", &self.schema.name)
            .field("values", &self.values)
            .finish()
    }
}

impl fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {{", self.schema.name)?;
        let mut first = true;
        for (name, field) in &self.schema.fields {
            if field.is_serializable() {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match self.values.get(name) {
                Some(Value::List(items)) if !items.is_empty() => {
                    write!(f, "{}=[({} items)]", name, items.len())?
                }
                Some(Value::Map(entries)) if !entries.is_empty() => {
                    write!(f, "{}={{({} items)}}", name, entries.len())?
                }
                Some(Value::Model(instance)) => {
                    write!(f, "{}={}", name, instance.schema.name)?
                }
                Some(Value::Str(s)) => write!(f, "{}='{}'", name, s)?,
                Some(Value::Bool(b)) => write!(f, "{}={}", name, b)?,
                Some(Value::Int(i)) => write!(f, "{}={}", name, i)?,
                Some(Value::Float(v)) => write!(f, "{}={}", name, v)?,
                Some(Value::Null) => write!(f, "{}=None", name)?,
                Some(Value::Missing) | None => write!(f, "{}=Missing", name)?,
                Some(Value::List(_)) => write!(f, "{}=[]", name)?,
                Some(Value::Map(_)) => write!(f, "{}={{}}", name)?,
                Some(Value::Any(json)) => write!(f, "{}={}", name, json)?,
            }
        }
        write!(f, "}}>")
    }
}
