//! Enumeration over all field descriptor variants.

use crate::schema::types::field::atomic::{BoolField, FloatField, IntField, StrField};
use crate::schema::types::field::common::{AnyField, Field, FieldCommon};
use crate::schema::types::field::compound::{ListField, MapField};
use crate::schema::types::field::model_field::{DynamicModelField, ModelField};
use crate::schema::types::field::serializable::SerializableField;

/// One compiled field descriptor. The semantic type is fixed at schema
/// resolution time and never changes afterwards.
#[derive(Debug, Clone)]
pub enum FieldVariant {
    Bool(BoolField),
    Int(IntField),
    Float(FloatField),
    Str(StrField),
    List(ListField),
    Map(MapField),
    /// Nested structure of one specific type.
    Model(ModelField),
    /// Discriminated union of structure types.
    Dynamic(DynamicModelField),
    /// Free-form primitive value.
    Any(AnyField),
    /// Computed, output-only field.
    Serializable(SerializableField),
}

impl Field for FieldVariant {
    fn common(&self) -> &FieldCommon {
        match self {
            Self::Bool(f) => f.common(),
            Self::Int(f) => f.common(),
            Self::Float(f) => f.common(),
            Self::Str(f) => f.common(),
            Self::List(f) => f.common(),
            Self::Map(f) => f.common(),
            Self::Model(f) => f.common(),
            Self::Dynamic(f) => f.common(),
            Self::Any(f) => f.common(),
            Self::Serializable(f) => f.common(),
        }
    }

    fn common_mut(&mut self) -> &mut FieldCommon {
        match self {
            Self::Bool(f) => f.common_mut(),
            Self::Int(f) => f.common_mut(),
            Self::Float(f) => f.common_mut(),
            Self::Str(f) => f.common_mut(),
            Self::List(f) => f.common_mut(),
            Self::Map(f) => f.common_mut(),
            Self::Model(f) => f.common_mut(),
            Self::Dynamic(f) => f.common_mut(),
            Self::Any(f) => f.common_mut(),
            Self::Serializable(f) => f.common_mut(),
        }
    }
}

impl FieldVariant {
    /// Human-readable name of the field's semantic type, used in
    /// configuration error messages.
    pub fn type_repr(&self) -> String {
        match self {
            Self::Bool(_) => "bool".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Float(_) => "float".to_string(),
            Self::Str(_) => "str".to_string(),
            Self::List(f) => format!("List[{}]", f.item.type_repr()),
            Self::Map(f) => format!("Dict[str, {}]", f.value.type_repr()),
            Self::Model(f) => f.target.name().to_string(),
            Self::Dynamic(f) => f.type_repr(),
            Self::Any(_) => "Any".to_string(),
            Self::Serializable(_) => "serializable".to_string(),
        }
    }

    /// Empty sentinel the serialized value is compared against when
    /// `hide_empty` is configured; `None` for types without one.
    pub(crate) fn empty_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Bool(_) => Some(serde_json::Value::Bool(false)),
            Self::Int(_) => Some(serde_json::json!(0)),
            Self::Float(_) => Some(serde_json::json!(0.0)),
            Self::Str(_) => Some(serde_json::json!("")),
            Self::List(_) => Some(serde_json::json!([])),
            Self::Map(_) | Self::Model(_) => Some(serde_json::json!({})),
            Self::Dynamic(_) | Self::Any(_) | Self::Serializable(_) => None,
        }
    }

    pub fn is_serializable(&self) -> bool {
        matches!(self, Self::Serializable(_))
    }
}
