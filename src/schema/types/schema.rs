//! The compiled schema of one structure type.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::instance::ModelInstance;
use crate::schema::roles::{FinalizedRole, Role};
use crate::schema::types::field::{Field, FieldVariant};

/// Whole-instance validator. Receives the instance and the caller context;
/// returns messages keyed by field name (`Some`) or attached to the
/// structure root (`None`).
pub type InstanceValidator =
    Arc<dyn Fn(&ModelInstance, Option<&dyn Any>) -> Vec<(Option<String>, String)> + Send + Sync>;

/// Compiled descriptor table plus role and discriminator information for one
/// structure type. Immutable and freely shared once published by the
/// registry.
#[derive(Clone)]
pub struct Schema {
    /// Structure type name, the registry key.
    pub name: String,
    /// Discriminator value identifying this type inside polymorphic unions.
    pub type_name: Option<String>,
    /// Ordered mapping from field name to its compiled descriptor.
    pub fields: IndexMap<String, FieldVariant>,
    pub(crate) roles: Vec<FinalizedRole>,
    pub(crate) instance_validators: Vec<InstanceValidator>,
}

/// Field visibility of a role on a schema.
pub(crate) enum RoleView<'a> {
    /// Role not configured for this type, all fields visible.
    All,
    /// Role not configured and empty by default, no fields visible.
    Empty,
    /// Configured visibility set.
    Fields(&'a HashSet<String>),
}

impl RoleView<'_> {
    pub(crate) fn allows(&self, field_name: &str) -> bool {
        match self {
            RoleView::All => true,
            RoleView::Empty => false,
            RoleView::Fields(fields) => fields.contains(field_name),
        }
    }
}

impl Schema {
    /// Looks up a field descriptor by declared name.
    pub fn field(&self, name: &str) -> Option<&FieldVariant> {
        self.fields.get(name)
    }

    pub(crate) fn role_view(&self, role: Role) -> RoleView<'_> {
        for finalized in &self.roles {
            if finalized.role == role {
                return RoleView::Fields(&finalized.fields);
            }
        }
        if role.empty_by_default() {
            RoleView::Empty
        } else {
            RoleView::All
        }
    }

    /// Fields present in serialized output for the given role. Omits fields
    /// suppressed by the role and fields with no output name.
    pub fn fields_for_role(&self, role: Role) -> Vec<&FieldVariant> {
        let view = self.role_view(role);
        self.fields
            .iter()
            .filter(|(name, field)| view.allows(name) && field.output_name().is_some())
            .map(|(_, field)| field)
            .collect()
    }

    /// Output key names present for the given role, in schema order.
    pub fn field_names_for_role(&self, role: Role) -> Vec<String> {
        self.fields_for_role(role)
            .into_iter()
            .filter_map(|field| field.output_name().map(|name| name.to_string()))
            .collect()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("roles", &self.roles)
            .field("instance_validators", &self.instance_validators.len())
            .finish()
    }
}
