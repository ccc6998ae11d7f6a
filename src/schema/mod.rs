//! Schema declaration, resolution and the role system.

pub mod builder;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod types;

pub use builder::{FieldDef, ModelDef};
pub use registry::SchemaRegistry;
pub use roles::{Role, RoleDef, DEFAULT_ROLE};

// Re-export the central types at the schema module level.
pub use types::{
    ConversionError, ErrorNode, ErrorTree, Field, FieldVariant, Schema, SchemaError,
    ValidationError,
};
