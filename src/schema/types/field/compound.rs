//! Compound field descriptors: lists and string-keyed maps.
//!
//! Element descriptors are full field descriptors themselves, so compound
//! types nest to arbitrary depth. Element coercion and validation recursion
//! lives in the engines; this module holds the descriptors and their own
//! length rules.

use crate::impl_field;
use crate::schema::types::field::atomic::plural;
use crate::schema::types::field::common::FieldCommon;
use crate::schema::types::field::variant::FieldVariant;

/// List of elements described by a nested field descriptor.
#[derive(Debug, Clone)]
pub struct ListField {
    pub inner: FieldCommon,
    pub item: Box<FieldVariant>,
    pub min_length: usize,
    pub max_length: Option<usize>,
}

impl_field!(ListField);

/// String-keyed map with values described by a nested field descriptor.
///
/// Keys are not coerced (primitive maps already carry string keys); an
/// optional key descriptor contributes string rules applied to each key.
#[derive(Debug, Clone)]
pub struct MapField {
    pub inner: FieldCommon,
    pub key: Option<Box<FieldVariant>>,
    pub value: Box<FieldVariant>,
    pub min_length: usize,
    pub max_length: Option<usize>,
}

impl_field!(MapField);

/// Shared length rule for compound fields.
pub(crate) fn length_rule_messages(
    length: usize,
    min_length: usize,
    max_length: Option<usize>,
) -> Vec<String> {
    if min_length > 0 {
        if let Some(max) = max_length {
            if length < min_length || length > max {
                if min_length == max {
                    return vec![format!(
                        "Provide exactly {} item{}",
                        min_length,
                        plural(min_length)
                    )];
                }
                return vec![format!("Provide {} to {} items", min_length, max)];
            }
        } else if length < min_length {
            return vec![format!(
                "Provide at least {} item{}",
                min_length,
                plural(min_length)
            )];
        }
    } else if let Some(max) = max_length {
        if length > max {
            return vec![format!("Provide at most {} item{}", max, plural(max))];
        }
    }
    Vec::new()
}
