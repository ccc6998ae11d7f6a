//! Conversion engine: primitive input to typed instances.
//!
//! Conversion walks the schema's fields in order, coercing each input value
//! to the field's semantic type. Every field's coercion problem is recorded
//! before the outcome is decided; if anything failed, the whole conversion
//! fails and the partially populated instance is discarded. Unknown input
//! keys are ignored. Nested model references resolve through the registry
//! here, on first use.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value as Json;

use crate::instance::value::{json_type_name, Value};
use crate::instance::ModelInstance;
use crate::schema::registry::SchemaRegistry;
use crate::schema::types::errors::{ConversionError, PathError, SchemaError};
use crate::schema::types::field::{Field, FieldVariant};
use crate::schema::types::schema::Schema;

/// Conversion failure before it is wrapped for the caller: either data
/// problems with field paths, or a configuration error surfaced by lazy
/// resolution (always fatal, never aggregated).
pub(crate) enum ConvertFail {
    Data(Vec<PathError>),
    Schema(SchemaError),
}

impl From<SchemaError> for ConvertFail {
    fn from(err: SchemaError) -> Self {
        ConvertFail::Schema(err)
    }
}

pub(crate) fn convert_model(
    registry: &SchemaRegistry,
    schema: &Arc<Schema>,
    input: &Json,
) -> Result<ModelInstance, ConversionError> {
    match convert_mapping(registry, schema, input) {
        Ok(instance) => Ok(instance),
        Err(ConvertFail::Data(errors)) => {
            debug!(
                "Conversion of '{}' failed with {} error(s)",
                schema.name,
                errors.len()
            );
            Err(ConversionError::new(errors))
        }
        Err(ConvertFail::Schema(err)) => Err(ConversionError::Schema(err)),
    }
}

fn convert_mapping(
    registry: &SchemaRegistry,
    schema: &Arc<Schema>,
    input: &Json,
) -> Result<ModelInstance, ConvertFail> {
    let object = input.as_object().ok_or_else(|| {
        ConvertFail::Data(vec![(
            Vec::new(),
            format!("Supplied type {}, needs a mapping", json_type_name(input)),
        )])
    })?;

    let mut values: IndexMap<String, Value> = IndexMap::with_capacity(schema.fields.len());
    let mut errors: Vec<PathError> = Vec::new();

    for (field_name, field) in &schema.fields {
        if field.is_serializable() {
            continue;
        }
        let common = field.common();
        let raw = common.input_name.as_ref().and_then(|key| object.get(key));
        let value = match raw {
            None => common.fill_missing(),
            Some(Json::Null) => {
                if common.allow_none {
                    Value::Null
                } else {
                    errors.push((
                        vec![common.error_key().to_string()],
                        "Value must not be null".to_string(),
                    ));
                    Value::Missing
                }
            }
            Some(raw) => match coerce(registry, field, raw) {
                Ok(value) => value,
                Err(ConvertFail::Data(field_errors)) => {
                    let key = common.error_key().to_string();
                    errors.extend(field_errors.into_iter().map(|(mut path, message)| {
                        path.insert(0, key.clone());
                        (path, message)
                    }));
                    Value::Missing
                }
                Err(ConvertFail::Schema(err)) => return Err(ConvertFail::Schema(err)),
            },
        };
        values.insert(field_name.clone(), value);
    }

    if errors.is_empty() {
        Ok(ModelInstance::from_parts(schema.clone(), values))
    } else {
        Err(ConvertFail::Data(errors))
    }
}

/// Coerces one non-null primitive value to the field's semantic type.
/// Returned error paths are relative to the field.
fn coerce(
    registry: &SchemaRegistry,
    field: &FieldVariant,
    raw: &Json,
) -> Result<Value, ConvertFail> {
    match field {
        FieldVariant::Bool(f) => f.coerce(raw).map_err(fail_at_root),
        FieldVariant::Int(f) => f.coerce(raw).map_err(fail_at_root),
        FieldVariant::Float(f) => f.coerce(raw).map_err(fail_at_root),
        FieldVariant::Str(f) => f.coerce(raw).map_err(fail_at_root),
        FieldVariant::Any(_) => Ok(Value::Any(raw.clone())),
        FieldVariant::List(f) => {
            let items = raw.as_array().ok_or_else(|| {
                fail_at_root(format!("Expected a list, got a {}", json_type_name(raw)))
            })?;
            let mut converted = Vec::with_capacity(items.len());
            let mut errors: Vec<PathError> = Vec::new();
            for (index, item) in items.iter().enumerate() {
                match coerce_element(registry, &f.item, item) {
                    Ok(value) => converted.push(value),
                    Err(ConvertFail::Data(element_errors)) => {
                        push_nested(&mut errors, index.to_string(), element_errors);
                        converted.push(Value::Missing);
                    }
                    Err(fail) => return Err(fail),
                }
            }
            if errors.is_empty() {
                Ok(Value::List(converted))
            } else {
                Err(ConvertFail::Data(errors))
            }
        }
        FieldVariant::Map(f) => {
            let entries = raw.as_object().ok_or_else(|| {
                fail_at_root(format!("Expected a dict, got a {}", json_type_name(raw)))
            })?;
            let mut converted = IndexMap::with_capacity(entries.len());
            let mut errors: Vec<PathError> = Vec::new();
            for (key, value) in entries {
                match coerce_element(registry, &f.value, value) {
                    Ok(value) => {
                        converted.insert(key.clone(), value);
                    }
                    Err(ConvertFail::Data(element_errors)) => {
                        push_nested(&mut errors, key.clone(), element_errors);
                        converted.insert(key.clone(), Value::Missing);
                    }
                    Err(fail) => return Err(fail),
                }
            }
            if errors.is_empty() {
                Ok(Value::Map(converted))
            } else {
                Err(ConvertFail::Data(errors))
            }
        }
        FieldVariant::Model(f) => {
            let target = f.target.resolve(registry)?;
            let object = raw.is_object();
            if !object {
                return Err(fail_at_root(format!(
                    "Supplied type {}, needs a mapping or {}",
                    json_type_name(raw),
                    target.name
                )));
            }
            match convert_mapping(registry, &target, raw) {
                Ok(instance) => Ok(Value::Model(instance)),
                Err(fail) => Err(fail),
            }
        }
        FieldVariant::Dynamic(f) => {
            let dispatch = f.dispatch(registry)?;
            let entries = raw.as_object().ok_or_else(|| {
                fail_at_root(format!(
                    "Expected a mapping with a `type` field, got type {}",
                    json_type_name(raw)
                ))
            })?;
            let tag = entries.get("type").ok_or_else(|| {
                fail_at_root(
                    "Expected a mapping with a `type` field, got no `type` field".to_string(),
                )
            })?;
            let target = tag
                .as_str()
                .and_then(|tag| dispatch.get(tag))
                .ok_or_else(|| {
                    fail_at_root(format!(
                        "Got a mapping with unsupported `type` {}",
                        crate::instance::value::json_scalar_repr(tag)
                    ))
                })?
                .clone();
            match convert_mapping(registry, &target, raw) {
                Ok(instance) => Ok(Value::Model(instance)),
                Err(fail) => Err(fail),
            }
        }
        FieldVariant::Serializable(_) => {
            // Computed fields are skipped by the conversion loop.
            Ok(Value::Missing)
        }
    }
}

/// Coerces a list element or map value: nulls are legal only if the element
/// type permits absence.
fn coerce_element(
    registry: &SchemaRegistry,
    element: &FieldVariant,
    raw: &Json,
) -> Result<Value, ConvertFail> {
    if raw.is_null() {
        if element.allow_none() {
            return Ok(Value::Null);
        }
        return Err(fail_at_root("Value must not be null".to_string()));
    }
    coerce(registry, element, raw)
}

fn fail_at_root(message: String) -> ConvertFail {
    ConvertFail::Data(vec![(Vec::new(), message)])
}

fn push_nested(errors: &mut Vec<PathError>, key: String, nested: Vec<PathError>) {
    errors.extend(nested.into_iter().map(|(mut path, message)| {
        path.insert(0, key.clone());
        (path, message)
    }));
}
