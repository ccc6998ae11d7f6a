//! Declarative schema building.
//!
//! A structure type is declared by constructing a [`ModelDef`] — a name, an
//! ordered list of [`FieldDef`]s, optional roles, inheritance and
//! discriminator information — and registering it with a
//! [`SchemaRegistry`](crate::schema::registry::SchemaRegistry). Declarations
//! are compiled into immutable [`Schema`](crate::schema::types::Schema)s on
//! first use; every option is cross-checked against the field's semantic
//! type at that point.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::instance::value::Value;
use crate::instance::ModelInstance;
use crate::schema::roles::RoleDef;
use crate::schema::types::field::{DefaultProducer, FieldValidator, SerializableFn};
use crate::schema::types::schema::InstanceValidator;

/// Declared (not yet compiled) field: a semantic type marker plus options.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) kind: FieldKind,
    pub(crate) options: FieldOptions,
}

#[derive(Clone)]
pub(crate) enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    List(Box<FieldDef>),
    Map {
        key: Option<Box<FieldDef>>,
        value: Box<FieldDef>,
    },
    Model(String),
    OneOf(Vec<String>),
    Any,
    Computed(SerializableFn),
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("Bool"),
            FieldKind::Int => f.write_str("Int"),
            FieldKind::Float => f.write_str("Float"),
            FieldKind::Str => f.write_str("Str"),
            FieldKind::List(item) => f.debug_tuple("List").field(item).finish(),
            FieldKind::Map { key, value } => f
                .debug_struct("Map")
                .field("key", key)
                .field("value", value)
                .finish(),
            FieldKind::Model(name) => f.debug_tuple("Model").field(name).finish(),
            FieldKind::OneOf(names) => f.debug_tuple("OneOf").field(names).finish(),
            FieldKind::Any => f.write_str("Any"),
            FieldKind::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Recognized field options; the subset that applies depends on the
/// semantic type and is checked at schema resolution.
#[derive(Clone, Default)]
pub(crate) struct FieldOptions {
    pub default: Option<DeclaredDefault>,
    pub allow_none: bool,
    pub input_name: Option<String>,
    pub output_name: Option<String>,
    pub no_input: bool,
    pub no_output: bool,
    pub hide_none: bool,
    pub hide_false: bool,
    pub hide_zero: bool,
    pub hide_empty: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub choices: Option<Vec<String>>,
    pub validators: Vec<FieldValidator>,
}

#[derive(Clone)]
pub(crate) enum DeclaredDefault {
    Literal(Json),
    Producer(DefaultProducer),
}

impl std::fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldOptions")
            .field("allow_none", &self.allow_none)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl FieldDef {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            options: FieldOptions::default(),
        }
    }

    /// Boolean field.
    pub fn bool_() -> Self {
        Self::new(FieldKind::Bool)
    }

    /// Integer field.
    pub fn int() -> Self {
        Self::new(FieldKind::Int)
    }

    /// Floating point field.
    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    /// String field.
    pub fn str_() -> Self {
        Self::new(FieldKind::Str)
    }

    /// List field with the given element definition.
    pub fn list(item: FieldDef) -> Self {
        Self::new(FieldKind::List(Box::new(item)))
    }

    /// String-keyed map field with the given value definition.
    pub fn map(value: FieldDef) -> Self {
        Self::new(FieldKind::Map {
            key: None,
            value: Box::new(value),
        })
    }

    /// Map field with an explicit key definition whose string rules are
    /// applied to the keys. The key definition must be a string type.
    pub fn map_keyed(key: FieldDef, value: FieldDef) -> Self {
        Self::new(FieldKind::Map {
            key: Some(Box::new(key)),
            value: Box::new(value),
        })
    }

    /// Nested structure field referencing a schema by type name. The target
    /// does not need to be registered yet; it is bound lazily on first use,
    /// which permits self-referential and forward-declared structures.
    pub fn model(name: impl Into<String>) -> Self {
        Self::new(FieldKind::Model(name.into()))
    }

    /// Polymorphic field: one of the named structure types, selected by the
    /// reserved `type` discriminator key in input data.
    pub fn one_of(names: &[&str]) -> Self {
        Self::new(FieldKind::OneOf(
            names.iter().map(|n| n.to_string()).collect(),
        ))
    }

    /// Free-form field keeping its primitive value untouched.
    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    /// Computed output-only field evaluated from the instance at
    /// serialization time. Excluded from conversion and validation.
    pub fn computed<F>(accessor: F) -> Self
    where
        F: Fn(&ModelInstance) -> Value + Send + Sync + 'static,
    {
        Self::new(FieldKind::Computed(Arc::new(accessor)))
    }

    /// Literal default; the field is no longer required. The value is
    /// type-checked against the field's semantic type at resolution.
    pub fn default(mut self, value: impl Into<Json>) -> Self {
        self.options.default = Some(DeclaredDefault::Literal(value.into()));
        self
    }

    /// Zero-argument producer default, called once per conversion.
    pub fn default_fn<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options.default = Some(DeclaredDefault::Producer(Arc::new(producer)));
        self
    }

    /// Permit explicit null as a value for this field.
    pub fn allow_none(mut self) -> Self {
        self.options.allow_none = true;
        self
    }

    /// Alternative key for this field in primitive data, input and output.
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.options.input_name = Some(name.into());
        self
    }

    /// Alternative key for this field in serialized output only.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.options.output_name = Some(name.into());
        self
    }

    /// The field can never be filled from input data.
    pub fn no_input(mut self) -> Self {
        self.options.no_input = true;
        self
    }

    /// The field is never serialized.
    pub fn no_output(mut self) -> Self {
        self.options.no_output = true;
        self
    }

    /// Hide the output key when the value is null.
    pub fn hide_none(mut self) -> Self {
        self.options.hide_none = true;
        self
    }

    /// Hide the output key when the value is false (bool fields).
    pub fn hide_false(mut self) -> Self {
        self.options.hide_false = true;
        self
    }

    /// Hide the output key when the value is zero (numeric fields).
    pub fn hide_zero(mut self) -> Self {
        self.options.hide_zero = true;
        self
    }

    /// Hide the output key when the value is empty (strings, compounds and
    /// nested structures).
    pub fn hide_empty(mut self) -> Self {
        self.options.hide_empty = true;
        self
    }

    /// Validation: minimum numeric value (inclusive).
    pub fn min_value(mut self, value: f64) -> Self {
        self.options.min_value = Some(value);
        self
    }

    /// Validation: maximum numeric value (inclusive).
    pub fn max_value(mut self, value: f64) -> Self {
        self.options.max_value = Some(value);
        self
    }

    /// Validation: minimum string/compound length.
    pub fn min_length(mut self, length: usize) -> Self {
        self.options.min_length = Some(length);
        self
    }

    /// Validation: maximum string/compound length.
    pub fn max_length(mut self, length: usize) -> Self {
        self.options.max_length = Some(length);
        self
    }

    /// Validation: the string must match this regular expression.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options.pattern = Some(pattern.into());
        self
    }

    /// Validation: the string must equal one of the choices.
    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.options.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Custom validator callback; may return any number of messages.
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value, Option<&dyn Any>) -> Vec<String> + Send + Sync + 'static,
    {
        self.options.validators.push(Arc::new(validator));
        self
    }
}

/// Declaration of one structure type, registered with a
/// [`SchemaRegistry`](crate::schema::registry::SchemaRegistry).
#[derive(Clone)]
pub struct ModelDef {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) type_name: Option<String>,
    pub(crate) fields: Vec<(String, FieldDef)>,
    pub(crate) roles: Vec<RoleDef>,
    pub(crate) validators: Vec<InstanceValidator>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            type_name: None,
            fields: Vec::new(),
            roles: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Inherit fields, roles and instance validators from another declared
    /// structure type. Own declarations are applied after the parent's.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Discriminator value identifying this type inside polymorphic unions,
    /// serialized under the reserved `type` key.
    pub fn type_name(mut self, tag: impl Into<String>) -> Self {
        self.type_name = Some(tag.into());
        self
    }

    /// Declares a field. Order of declaration is the order of conversion
    /// and serialization.
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.push((name.into(), def));
        self
    }

    /// Attaches a role blacklist/whitelist to this type.
    pub fn role(mut self, def: RoleDef) -> Self {
        self.roles.push(def);
        self
    }

    /// Whole-instance validator run after per-field validation; may append
    /// field-keyed (`Some(field)`) or root-level (`None`) messages.
    pub fn instance_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ModelInstance, Option<&dyn Any>) -> Vec<(Option<String>, String)>
            + Send
            + Sync
            + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }
}

impl std::fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("roles", &self.roles)
            .field("validators", &self.validators.len())
            .finish()
    }
}
