//! Schema-driven data modeling: typed conversion, validation and role-based
//! serialization of JSON-shaped data.
//!
//! Structure types are declared once with [`ModelDef`] and registered in a
//! [`SchemaRegistry`]. The registry compiles each declaration into an
//! immutable [`Schema`] on first use; converting primitive input against a
//! schema produces a typed [`ModelInstance`] whose fields can be read,
//! mutated, validated and serialized back to primitive data.
//!
//! ```
//! use serde_json::json;
//! use typefold::{FieldDef, ModelDef, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         ModelDef::new("Employee")
//!             .field("name", FieldDef::str_())
//!             .field("salary", FieldDef::float().default(42.0).min_value(42.0)),
//!     )
//!     .unwrap();
//!
//! let employee = registry
//!     .convert("Employee", &json!({"name": "Ada", "salary": "50"}))
//!     .unwrap();
//! assert!(employee.validation_errors(None).is_empty());
//! assert_eq!(
//!     employee.serialize(),
//!     json!({"name": "Ada", "salary": 50.0})
//! );
//! ```
//!
//! Conversion is all-or-nothing and aggregates every field's coercion
//! problem into an [`ErrorTree`]; validation is a separate, re-runnable
//! pass returning the same tree shape. Roles ([`Role`]) shape serialized
//! output per structure type, composing over inheritance chains.

pub mod instance;
pub mod schema;

pub use instance::{ModelInstance, Value};
pub use schema::builder::{FieldDef, ModelDef};
pub use schema::registry::SchemaRegistry;
pub use schema::roles::{Role, RoleDef, DEFAULT_ROLE};
pub use schema::types::errors::{
    ConversionError, ErrorNode, ErrorTree, SchemaError, ValidationError, GLOBAL_KEY,
};
pub use schema::types::field::{Field, FieldVariant, ValidationContext};
pub use schema::types::schema::Schema;
