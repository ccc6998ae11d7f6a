//! Computed, output-only field descriptor.
//!
//! A serializable field never participates in conversion or validation; its
//! value is produced by a zero-argument accessor over the instance at
//! serialization time.

use std::fmt;
use std::sync::Arc;

use crate::impl_field;
use crate::instance::value::Value;
use crate::instance::ModelInstance;
use crate::schema::types::field::common::FieldCommon;

/// Accessor computing the serialized value of the field from the instance.
pub type SerializableFn = Arc<dyn Fn(&ModelInstance) -> Value + Send + Sync>;

/// Output-only field calculated from other fields.
#[derive(Clone)]
pub struct SerializableField {
    pub inner: FieldCommon,
    pub accessor: SerializableFn,
}

impl_field!(SerializableField);

impl fmt::Debug for SerializableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializableField")
            .field("inner", &self.inner)
            .finish()
    }
}
