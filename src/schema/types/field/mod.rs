//! Field descriptor types.

pub mod atomic;
pub mod common;
pub mod compound;
pub mod model_field;
pub mod serializable;
pub mod variant;

pub use atomic::{BoolField, FloatField, IntField, StrField};
pub use common::{
    AnyField, DefaultProducer, Field, FieldCommon, FieldDefault, FieldValidator, ValidationContext,
};
pub use compound::{ListField, MapField};
pub use model_field::{DynamicModelField, ModelField, SchemaRef};
pub use serializable::{SerializableField, SerializableFn};
pub use variant::FieldVariant;
