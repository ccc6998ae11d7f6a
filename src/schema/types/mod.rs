//! Compiled schema types: field descriptors, schemas and error types.

pub mod errors;
pub mod field;
pub mod schema;

pub use errors::{
    ConversionError, ErrorNode, ErrorTree, PathError, SchemaError, ValidationError, GLOBAL_KEY,
};
pub use field::{Field, FieldVariant};
pub use schema::{InstanceValidator, Schema};
