//! Serialization roles: named output-visibility policies.
//!
//! A [`Role`] is a cheap copyable handle into a process-wide table. Schemas
//! attach blacklists or whitelists of their fields to roles; a subtype's
//! declarations compose with its ancestors' unless explicitly overridden.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

struct RoleInfo {
    name: String,
    empty_by_default: bool,
}

static ROLES: Lazy<Mutex<Vec<RoleInfo>>> = Lazy::new(|| {
    Mutex::new(vec![RoleInfo {
        name: "default".to_string(),
        empty_by_default: false,
    }])
});

/// The role used when serialization is not given an explicit one; includes
/// every field unless a schema says otherwise.
pub const DEFAULT_ROLE: Role = Role { code: 0 };

/// Handle to a declared serialization role. Role handles should usually be
/// created once and shared (e.g. as statics initialized at startup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Role {
    code: usize,
}

impl Role {
    /// Declares a new role that includes all fields by default.
    pub fn new(name: impl Into<String>) -> Role {
        Self::declare(name.into(), false)
    }

    /// Declares a new role that excludes all fields of structure types that
    /// do not configure it explicitly.
    pub fn new_empty_by_default(name: impl Into<String>) -> Role {
        Self::declare(name.into(), true)
    }

    fn declare(name: String, empty_by_default: bool) -> Role {
        let mut roles = ROLES.lock().unwrap_or_else(PoisonError::into_inner);
        let code = roles.len();
        roles.push(RoleInfo {
            name,
            empty_by_default,
        });
        Role { code }
    }

    pub fn code(&self) -> usize {
        self.code
    }

    pub fn name(&self) -> String {
        let roles = ROLES.lock().unwrap_or_else(PoisonError::into_inner);
        roles
            .get(self.code)
            .map(|info| info.name.clone())
            .unwrap_or_default()
    }

    pub fn empty_by_default(&self) -> bool {
        let roles = ROLES.lock().unwrap_or_else(PoisonError::into_inner);
        roles
            .get(self.code)
            .map(|info| info.empty_by_default)
            .unwrap_or(false)
    }

    /// This role should include only the listed fields of the structure
    /// type it is attached to.
    pub fn whitelist(&self, fields: &[&str]) -> RoleDef {
        RoleDef {
            role: *self,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            is_whitelist: true,
            override_parents: false,
        }
    }

    /// This role should omit the listed fields of the structure type it is
    /// attached to.
    pub fn blacklist(&self, fields: &[&str]) -> RoleDef {
        RoleDef {
            role: *self,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            is_whitelist: false,
            override_parents: false,
        }
    }
}

/// A role's requested field visibility on one structure type, produced by
/// [`Role::blacklist`] or [`Role::whitelist`] and attached via the schema
/// builder.
#[derive(Debug, Clone)]
pub struct RoleDef {
    pub(crate) role: Role,
    pub(crate) fields: Vec<String>,
    pub(crate) is_whitelist: bool,
    pub(crate) override_parents: bool,
}

impl RoleDef {
    /// Reset rules inherited from ancestor types instead of composing with
    /// them: a whitelist hides even inherited fields unless listed, a
    /// blacklist shows even inherited fields unless listed.
    pub fn override_parents(mut self) -> Self {
        self.override_parents = true;
        self
    }
}

/// Finalized field visibility of one role on one schema, produced by role
/// composition over the ancestor chain.
#[derive(Debug, Clone)]
pub(crate) struct FinalizedRole {
    pub role: Role,
    pub fields: HashSet<String>,
}

impl FinalizedRole {
    /// Applies a requested blacklist/whitelist on top of the visibility
    /// inherited so far. `all_fields` covers inherited and own fields,
    /// `own_fields` only the fields the requesting type declares itself.
    pub(crate) fn apply_requested(
        &mut self,
        requested: &RoleDef,
        all_fields: &HashSet<String>,
        own_fields: &HashSet<String>,
    ) {
        let initial: HashSet<String> = if requested.override_parents {
            if requested.is_whitelist {
                HashSet::new()
            } else {
                all_fields.clone()
            }
        } else {
            std::mem::take(&mut self.fields)
        };
        let listed: HashSet<String> = requested.fields.iter().cloned().collect();
        self.fields = if requested.is_whitelist {
            initial.union(&listed).cloned().collect()
        } else {
            initial
                .union(own_fields)
                .filter(|name| !listed.contains(*name))
                .cloned()
                .collect()
        };
    }
}
