//! Nested-structure and polymorphic (discriminated-union) field descriptors.
//!
//! Nested schemas are referenced by name and bound lazily: a [`SchemaRef`]
//! records the target's name at declaration time and resolves it through the
//! registry on first use, memoizing the handle. This is what allows
//! self-referential and forward-declared structure types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::impl_field;
use crate::schema::registry::SchemaRegistry;
use crate::schema::types::errors::SchemaError;
use crate::schema::types::field::common::FieldCommon;
use crate::schema::types::schema::Schema;

/// Lazily bound reference to another schema, by type name.
#[derive(Clone)]
pub struct SchemaRef {
    name: String,
    resolved: OnceCell<Arc<Schema>>,
}

// Not derived: printing the resolved schema would recurse forever on
// self-referential structures.
impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRef")
            .field("name", &self.name)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

impl SchemaRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: OnceCell::new(),
        }
    }

    /// Name of the referenced schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the reference through the registry, memoizing the handle.
    /// A configuration error in the target surfaces here, on first use.
    pub fn resolve(&self, registry: &SchemaRegistry) -> Result<Arc<Schema>, SchemaError> {
        self.resolved
            .get_or_try_init(|| registry.resolve(&self.name))
            .cloned()
    }
}

/// Field holding one specific nested structure type.
#[derive(Debug, Clone)]
pub struct ModelField {
    pub inner: FieldCommon,
    pub target: SchemaRef,
}

impl_field!(ModelField);

/// Field holding one of several structure types, selected by the reserved
/// `type` discriminator key in the input mapping.
#[derive(Clone)]
pub struct DynamicModelField {
    pub inner: FieldCommon,
    pub members: Vec<SchemaRef>,
    dispatch: OnceCell<HashMap<String, Arc<Schema>>>,
}

impl fmt::Debug for DynamicModelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicModelField")
            .field("inner", &self.inner)
            .field("members", &self.members)
            .finish()
    }
}

impl_field!(DynamicModelField);

impl DynamicModelField {
    pub fn new(inner: FieldCommon, members: Vec<SchemaRef>) -> Self {
        Self {
            inner,
            members,
            dispatch: OnceCell::new(),
        }
    }

    /// Dispatch table from discriminator value to member schema, built on
    /// first use. Verifies that every member declares a discriminator and
    /// that the values are pairwise distinct; violations are configuration
    /// errors, not per-instance errors.
    pub fn dispatch(
        &self,
        registry: &SchemaRegistry,
    ) -> Result<&HashMap<String, Arc<Schema>>, SchemaError> {
        self.dispatch.get_or_try_init(|| {
            let mut table = HashMap::new();
            for member in &self.members {
                let schema = member.resolve(registry)?;
                let tag = schema.type_name.clone().ok_or_else(|| {
                    SchemaError::InvalidDiscriminator(format!(
                        "Schema {} used in a dynamic model field but does not declare a type name",
                        schema.name
                    ))
                })?;
                if let Some(existing) = table.insert(tag.clone(), schema.clone()) {
                    return Err(SchemaError::InvalidDiscriminator(format!(
                        "Conflicting dynamic model field types: {} vs {} both use '{}'",
                        existing.name, schema.name, tag
                    )));
                }
            }
            Ok(table)
        })
    }

    pub(crate) fn type_repr(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(|m| m.name()).collect();
        format!("Union[{}]", names.join(", "))
    }
}
