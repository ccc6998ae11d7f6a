//! Serialization engine: typed instances back to primitive data.
//!
//! For each field in schema order, the active role decides whether the key
//! is emitted at all; the value then serializes recursively with the role
//! passed down, so nested structures stay role-consistent. Hide flags are
//! applied to the computed primitive value last. Serialization never fails.

use serde_json::{Map, Value as Json};

use crate::instance::value::Value;
use crate::instance::ModelInstance;
use crate::schema::roles::Role;
use crate::schema::types::field::{Field, FieldVariant};

pub(crate) fn to_primitive(instance: &ModelInstance, role: Role) -> Json {
    let view = instance.schema.role_view(role);
    let mut output = Map::with_capacity(instance.schema.fields.len());
    let missing = Value::Missing;

    for (field_name, field) in &instance.schema.fields {
        if !view.allows(field_name) {
            continue;
        }
        let common = field.common();
        let output_name = match &common.output_name {
            Some(name) => name,
            None => continue,
        };

        let primitive = match field {
            FieldVariant::Serializable(f) => {
                let value = (f.accessor)(instance);
                if value.is_missing() {
                    continue;
                }
                value_to_json(field, &value, role)
            }
            _ => {
                let value = instance.values.get(field_name).unwrap_or(&missing);
                if value.is_missing() {
                    continue;
                }
                value_to_json(field, value, role)
            }
        };

        if common.hide_none && primitive.is_null() {
            continue;
        }
        if common.hide_empty {
            if let Some(empty) = field.empty_json() {
                if primitive == empty {
                    continue;
                }
            }
        }
        output.insert(output_name.clone(), primitive);
    }

    Json::Object(output)
}

/// Serializes one value under its descriptor, recursing into containers and
/// nested structures. Polymorphic values re-attach their discriminator
/// under the reserved `type` key.
fn value_to_json(field: &FieldVariant, value: &Value, role: Role) -> Json {
    match (field, value) {
        (FieldVariant::List(f), Value::List(items)) => Json::Array(
            items
                .iter()
                .map(|item| value_to_json(&f.item, item, role))
                .collect(),
        ),
        (FieldVariant::Map(f), Value::Map(entries)) => Json::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), value_to_json(&f.value, entry, role)))
                .collect(),
        ),
        (FieldVariant::Model(_), Value::Model(instance)) => to_primitive(instance, role),
        (FieldVariant::Dynamic(_), Value::Model(instance)) => {
            let mut primitive = to_primitive(instance, role);
            if let (Json::Object(object), Some(tag)) =
                (&mut primitive, &instance.schema.type_name)
            {
                object.insert("type".to_string(), Json::String(tag.clone()));
            }
            primitive
        }
        _ => plain_value_to_json(value, role),
    }
}

/// Fallback serialization used where no descriptor applies (free-form
/// fields, computed values, programmatically assigned shapes).
fn plain_value_to_json(value: &Value, role: Role) -> Json {
    match value {
        Value::Missing | Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Json::from(*f),
        Value::Str(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(|item| plain_value_to_json(item, role))
                .collect(),
        ),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), plain_value_to_json(entry, role)))
                .collect(),
        ),
        Value::Model(instance) => to_primitive(instance, role),
        Value::Any(json) => json.clone(),
    }
}
