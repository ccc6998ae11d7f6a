//! Base machinery shared by all field descriptors.
//!
//! Every descriptor embeds a [`FieldCommon`] carrying the options that apply
//! regardless of the field's semantic type. The [`Field`] trait exposes
//! accessors over that common part; concrete descriptors implement it via the
//! [`impl_field!`](crate::impl_field) macro and
//! [`FieldVariant`](super::variant::FieldVariant) dispatches to them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::instance::value::Value;

/// Opaque caller-supplied context handed to validator callbacks.
pub type ValidationContext<'a> = Option<&'a dyn Any>;

/// Custom per-field validator. Receives the field's current value and the
/// caller context; returns zero or more error messages.
pub type FieldValidator = Arc<dyn Fn(&Value, ValidationContext) -> Vec<String> + Send + Sync>;

/// Zero-argument producer used for non-literal defaults.
pub type DefaultProducer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default for a non-required field: a fixed value or a producer called per
/// conversion.
#[derive(Clone)]
pub enum FieldDefault {
    Literal(Value),
    Producer(DefaultProducer),
}

impl FieldDefault {
    pub(crate) fn produce(&self) -> Value {
        match self {
            FieldDefault::Literal(value) => value.clone(),
            FieldDefault::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            FieldDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Options common to every field descriptor.
#[derive(Clone)]
pub struct FieldCommon {
    /// Declared field name, the key of the instance value bag.
    pub name: String,
    /// Key looked up in primitive input. `None` means the field can never be
    /// filled from input data.
    pub input_name: Option<String>,
    /// Key emitted in primitive output. `None` means the field is never
    /// serialized.
    pub output_name: Option<String>,
    /// True when the field has no default and must be present in input.
    pub required: bool,
    /// True when an explicit null is a legal value for this field.
    pub allow_none: bool,
    pub default: Option<FieldDefault>,
    /// Suppress the output key when the serialized value is null.
    pub hide_none: bool,
    /// Suppress the output key when the serialized value equals the field
    /// type's empty sentinel (false, 0, "", [], {}).
    pub hide_empty: bool,
    pub validators: Vec<FieldValidator>,
}

impl FieldCommon {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            input_name: Some(name.clone()),
            output_name: Some(name.clone()),
            name,
            required: true,
            allow_none: false,
            default: None,
            hide_none: false,
            hide_empty: false,
            validators: Vec::new(),
        }
    }

    /// Value used when the input key is absent: the default if one exists,
    /// `Missing` otherwise.
    pub(crate) fn fill_missing(&self) -> Value {
        match &self.default {
            Some(default) => default.produce(),
            None => Value::Missing,
        }
    }

    /// Name used in error paths: the input name, falling back to the output
    /// name and finally the declared name.
    pub(crate) fn error_key(&self) -> &str {
        self.input_name
            .as_deref()
            .or(self.output_name.as_deref())
            .unwrap_or(&self.name)
    }
}

impl fmt::Debug for FieldCommon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCommon")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("required", &self.required)
            .field("allow_none", &self.allow_none)
            .field("default", &self.default)
            .field("hide_none", &self.hide_none)
            .field("hide_empty", &self.hide_empty)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Common interface for all schema fields.
///
/// Exposes the options every descriptor carries; type-specific behavior
/// (coercion, rules, serialization) lives on the descriptors themselves and
/// is dispatched through `FieldVariant`.
pub trait Field {
    /// Returns the common options of this field.
    fn common(&self) -> &FieldCommon;

    /// Returns the common options mutably. Used during schema resolution
    /// only; descriptors are immutable once the schema is published.
    fn common_mut(&mut self) -> &mut FieldCommon;

    /// Declared field name.
    fn name(&self) -> &str {
        &self.common().name
    }

    /// Key looked up in primitive input, if the field is fillable.
    fn input_name(&self) -> Option<&str> {
        self.common().input_name.as_deref()
    }

    /// Key used in primitive output, if the field is serialized.
    fn output_name(&self) -> Option<&str> {
        self.common().output_name.as_deref()
    }

    fn required(&self) -> bool {
        self.common().required
    }

    fn allow_none(&self) -> bool {
        self.common().allow_none
    }
}

/// Implements the [`Field`] accessors for a descriptor struct embedding its
/// common part as `inner`.
#[macro_export]
macro_rules! impl_field {
    ($t:ty) => {
        impl $crate::schema::types::field::Field for $t {
            fn common(&self) -> &$crate::schema::types::field::FieldCommon {
                &self.inner
            }

            fn common_mut(&mut self) -> &mut $crate::schema::types::field::FieldCommon {
                &mut self.inner
            }
        }
    };
}

/// Free-form field: the raw primitive value is kept as-is, without coercion,
/// rules or recursion.
#[derive(Debug, Clone)]
pub struct AnyField {
    pub inner: FieldCommon,
}

impl_field!(AnyField);
