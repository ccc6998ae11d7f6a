//! Validation engine.
//!
//! A separate, idempotent pass over an already-converted instance: built-in
//! rules per field, custom field validators, then whole-instance validators.
//! Validation never mutates the instance and never fails — it produces a
//! list of path/message pairs the caller folds into an
//! [`ErrorTree`](crate::schema::types::errors::ErrorTree). A `Missing`
//! field (or an unexpected null) yields exactly the required message and
//! skips that field's remaining rules.

use crate::instance::value::Value;
use crate::instance::ModelInstance;
use crate::schema::types::errors::PathError;
use crate::schema::types::field::{Field, FieldVariant, ValidationContext};

const REQUIRED_MESSAGE: &str = "This field is required";

pub(crate) fn validation_errors(
    instance: &ModelInstance,
    context: ValidationContext,
) -> Vec<PathError> {
    let mut errors: Vec<PathError> = Vec::new();
    let missing = Value::Missing;

    for (field_name, field) in &instance.schema.fields {
        if field.is_serializable() {
            continue;
        }
        let value = instance.values.get(field_name).unwrap_or(&missing);
        let key = field.common().error_key().to_string();
        for (mut path, message) in value_errors(field, value, context) {
            path.insert(0, key.clone());
            errors.push((path, message));
        }
    }

    for validator in &instance.schema.instance_validators {
        for (field, message) in validator(instance, context) {
            let path = field.map(|name| vec![name]).unwrap_or_default();
            errors.push((path, message));
        }
    }

    errors
}

/// Errors of one value against one descriptor, paths relative to the field.
fn value_errors(
    field: &FieldVariant,
    value: &Value,
    context: ValidationContext,
) -> Vec<PathError> {
    if value.is_missing() || (value.is_null() && !field.allow_none()) {
        return vec![(Vec::new(), REQUIRED_MESSAGE.to_string())];
    }

    let mut errors: Vec<PathError> = Vec::new();
    if !value.is_null() {
        rule_errors(field, value, context, &mut errors);
    }
    // Custom validators also see permitted nulls.
    for validator in &field.common().validators {
        for message in validator(value, context) {
            errors.push((Vec::new(), message));
        }
    }
    errors
}

fn rule_errors(
    field: &FieldVariant,
    value: &Value,
    context: ValidationContext,
    errors: &mut Vec<PathError>,
) {
    match (field, value) {
        (FieldVariant::Int(f), Value::Int(i)) => {
            for message in f.rule_messages(*i) {
                errors.push((Vec::new(), message));
            }
        }
        (FieldVariant::Float(f), Value::Float(v)) => {
            for message in f.rule_messages(*v) {
                errors.push((Vec::new(), message));
            }
        }
        (FieldVariant::Str(f), Value::Str(s)) => {
            for message in f.rule_messages(s) {
                errors.push((Vec::new(), message));
            }
        }
        (FieldVariant::List(f), Value::List(items)) => {
            for message in
                crate::schema::types::field::compound::length_rule_messages(
                    items.len(),
                    f.min_length,
                    f.max_length,
                )
            {
                errors.push((Vec::new(), message));
            }
            for (index, item) in items.iter().enumerate() {
                for (mut path, message) in value_errors(&f.item, item, context) {
                    path.insert(0, index.to_string());
                    errors.push((path, message));
                }
            }
        }
        (FieldVariant::Map(f), Value::Map(entries)) => {
            for message in
                crate::schema::types::field::compound::length_rule_messages(
                    entries.len(),
                    f.min_length,
                    f.max_length,
                )
            {
                errors.push((Vec::new(), message));
            }
            for (key, entry) in entries {
                if let Some(key_field) = &f.key {
                    let key_value = Value::Str(key.clone());
                    for (mut path, message) in value_errors(key_field, &key_value, context) {
                        path.insert(0, key.clone());
                        errors.push((path, message));
                    }
                }
                for (mut path, message) in value_errors(&f.value, entry, context) {
                    path.insert(0, key.clone());
                    errors.push((path, message));
                }
            }
        }
        (FieldVariant::Model(_), Value::Model(instance))
        | (FieldVariant::Dynamic(_), Value::Model(instance)) => {
            errors.extend(validation_errors(instance, context));
        }
        // Free-form values carry no rules; mismatched shapes were already
        // reported by conversion.
        _ => {}
    }
}
