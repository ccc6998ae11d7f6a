//! Compilation of declared structure types into immutable schemas.
//!
//! This is where every declared option is cross-checked against the field's
//! semantic type, defaults are type-checked, inherited fields are merged and
//! role declarations are composed over the ancestor chain. Any inconsistency
//! is a [`SchemaError`] that aborts resolution of the whole type.

use std::collections::{HashSet, HashMap};

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::Value as Json;

use crate::instance::value::Value;
use crate::schema::builder::{DeclaredDefault, FieldDef, FieldKind, FieldOptions, ModelDef};
use crate::schema::registry::SchemaRegistry;
use crate::schema::roles::{FinalizedRole, Role, RoleDef};
use crate::schema::types::errors::SchemaError;
use crate::schema::types::field::{
    AnyField, BoolField, DynamicModelField, Field, FieldCommon, FieldDefault, FieldVariant,
    FloatField, IntField, ListField, MapField, ModelField, SchemaRef, SerializableField, StrField,
};
use crate::schema::types::schema::Schema;

/// Compiles a declaration into a schema. Parent types are resolved through
/// the registry (and therefore compiled first); nested model references are
/// left unresolved for lazy binding.
pub(crate) fn compile(def: &ModelDef, registry: &SchemaRegistry) -> Result<Schema, SchemaError> {
    if def.name.is_empty() {
        return Err(SchemaError::InvalidSchema(
            "Schema name cannot be empty".to_string(),
        ));
    }

    let parent = match &def.parent {
        Some(parent_name) => Some(registry.resolve(parent_name)?),
        None => None,
    };

    let mut fields: IndexMap<String, FieldVariant> = parent
        .as_ref()
        .map(|p| p.fields.clone())
        .unwrap_or_default();

    let mut own_field_names: HashSet<String> = HashSet::new();
    for (field_name, field_def) in &def.fields {
        if field_name.is_empty() {
            return Err(SchemaError::InvalidField(format!(
                "{}: field names cannot be empty",
                def.name
            )));
        }
        if !own_field_names.insert(field_name.clone()) {
            return Err(SchemaError::InvalidField(format!(
                "{}: field `{}` declared multiple times",
                def.name, field_name
            )));
        }
        let variant = compile_field(field_name, field_def)?;
        // Redefining an inherited field keeps its position in the order.
        fields.insert(field_name.clone(), variant);
    }

    let all_field_names: HashSet<String> = fields.keys().cloned().collect();
    let roles = compose_roles(
        &def.name,
        parent.as_deref(),
        &def.roles,
        &all_field_names,
        &own_field_names,
    )?;

    let mut instance_validators = parent
        .as_ref()
        .map(|p| p.instance_validators.clone())
        .unwrap_or_default();
    instance_validators.extend(def.validators.iter().cloned());

    debug!(
        "Compiled schema '{}' with {} field(s) and {} role(s)",
        def.name,
        fields.len(),
        roles.len()
    );

    Ok(Schema {
        name: def.name.clone(),
        type_name: def.type_name.clone(),
        fields,
        roles,
        instance_validators,
    })
}

fn compile_field(name: &str, def: &FieldDef) -> Result<FieldVariant, SchemaError> {
    let options = &def.options;

    if let FieldKind::Computed(accessor) = &def.kind {
        check_computed_options(name, options)?;
        let mut inner = FieldCommon::new(name);
        inner.input_name = None;
        inner.required = false;
        inner.hide_none = options.hide_none;
        if options.no_output {
            inner.output_name = None;
        } else if let Some(output_name) = &options.output_name {
            inner.output_name = Some(output_name.clone());
        }
        return Ok(FieldVariant::Serializable(SerializableField {
            inner,
            accessor: accessor.clone(),
        }));
    }

    let mut inner = FieldCommon::new(name);
    inner.allow_none = options.allow_none;
    inner.validators = options.validators.clone();
    inner.hide_none = options.hide_none;
    if options.no_input {
        inner.input_name = None;
    } else if let Some(input_name) = &options.input_name {
        inner.input_name = Some(input_name.clone());
    }
    if options.no_output {
        inner.output_name = None;
    } else if let Some(output_name) = &options.output_name {
        inner.output_name = Some(output_name.clone());
    } else if let Some(input_name) = &options.input_name {
        // An explicit input name renames the output key as well.
        inner.output_name = Some(input_name.clone());
    }

    let mut variant = build_variant(name, &def.kind, options, inner)?;
    check_hide_flags(name, &variant, options)?;
    check_rule_options(name, &variant, options)?;
    // The type-specific flags all suppress the type's empty sentinel.
    variant.common_mut().hide_empty =
        options.hide_false || options.hide_zero || options.hide_empty;
    apply_default(name, &mut variant, options)?;
    Ok(variant)
}

fn build_variant(
    name: &str,
    kind: &FieldKind,
    options: &FieldOptions,
    inner: FieldCommon,
) -> Result<FieldVariant, SchemaError> {
    Ok(match kind {
        FieldKind::Bool => FieldVariant::Bool(BoolField { inner }),
        FieldKind::Int => {
            let min_value = int_bound(name, "min_value", options.min_value)?;
            let max_value = int_bound(name, "max_value", options.max_value)?;
            FieldVariant::Int(IntField {
                inner,
                min_value,
                max_value,
            })
        }
        FieldKind::Float => FieldVariant::Float(FloatField {
            inner,
            min_value: options.min_value,
            max_value: options.max_value,
        }),
        FieldKind::Str => {
            let has_length = options.min_length.unwrap_or(0) > 0 || options.max_length.is_some();
            let configured =
                [has_length, options.choices.is_some(), options.pattern.is_some()]
                    .iter()
                    .filter(|c| **c)
                    .count();
            if configured > 1 {
                return Err(SchemaError::InvalidField(format!(
                    "Field `{}`: can only validate length, choices or regex; \
                     not combinations of these",
                    name
                )));
            }
            let pattern = match &options.pattern {
                Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                    SchemaError::InvalidField(format!("Field `{}`: invalid pattern: {}", name, e))
                })?),
                None => None,
            };
            FieldVariant::Str(StrField {
                inner,
                min_length: options.min_length.unwrap_or(0),
                max_length: options.max_length,
                choices: options.choices.clone(),
                pattern,
            })
        }
        FieldKind::List(item) => FieldVariant::List(ListField {
            inner,
            item: Box::new(compile_element(name, "item", item)?),
            min_length: options.min_length.unwrap_or(0),
            max_length: options.max_length,
        }),
        FieldKind::Map { key, value } => {
            let key = match key {
                Some(key_def) => {
                    if !matches!(key_def.kind, FieldKind::Str) {
                        return Err(SchemaError::InvalidField(format!(
                            "Field `{}`: map key definitions must be str",
                            name
                        )));
                    }
                    Some(Box::new(compile_element(name, "key", key_def)?))
                }
                None => None,
            };
            FieldVariant::Map(MapField {
                inner,
                key,
                value: Box::new(compile_element(name, "value", value)?),
                min_length: options.min_length.unwrap_or(0),
                max_length: options.max_length,
            })
        }
        FieldKind::Model(target) => FieldVariant::Model(ModelField {
            inner,
            target: SchemaRef::new(target.clone()),
        }),
        FieldKind::OneOf(members) => {
            if members.is_empty() {
                return Err(SchemaError::InvalidField(format!(
                    "Field `{}`: union fields need at least one member type",
                    name
                )));
            }
            FieldVariant::Dynamic(DynamicModelField::new(
                inner,
                members.iter().map(SchemaRef::new).collect(),
            ))
        }
        FieldKind::Any => FieldVariant::Any(AnyField { inner }),
        FieldKind::Computed(_) => unreachable!("handled before build_variant"),
    })
}

fn int_bound(name: &str, option: &str, bound: Option<f64>) -> Result<Option<i64>, SchemaError> {
    match bound {
        None => Ok(None),
        Some(value) if value.fract() == 0.0 => Ok(Some(value as i64)),
        Some(value) => Err(SchemaError::InvalidField(format!(
            "Field `{}`: {} {} for an int field must be a whole number",
            name, option, value
        ))),
    }
}

/// Element definitions carry a type, rules, allow_none and validators; the
/// remaining options only make sense on named fields.
fn compile_element(
    field_name: &str,
    position: &str,
    def: &FieldDef,
) -> Result<FieldVariant, SchemaError> {
    let options = &def.options;
    if options.default.is_some()
        || options.input_name.is_some()
        || options.output_name.is_some()
        || options.no_input
        || options.no_output
        || options.hide_none
        || options.hide_false
        || options.hide_zero
        || options.hide_empty
    {
        return Err(SchemaError::InvalidField(format!(
            "Field `{}`: {} definitions only support the type, rules, \
             allow_none and validators",
            field_name, position
        )));
    }
    if matches!(def.kind, FieldKind::Computed(_)) {
        return Err(SchemaError::InvalidField(format!(
            "Field `{}`: serializable fields cannot be used as {} definitions",
            field_name, position
        )));
    }
    compile_field(&format!("{}.{}", field_name, position), def)
}

fn check_computed_options(name: &str, options: &FieldOptions) -> Result<(), SchemaError> {
    let unsupported = options.default.is_some()
        || options.allow_none
        || options.input_name.is_some()
        || options.no_input
        || options.hide_false
        || options.hide_zero
        || options.hide_empty
        || options.min_value.is_some()
        || options.max_value.is_some()
        || options.min_length.is_some()
        || options.max_length.is_some()
        || options.pattern.is_some()
        || options.choices.is_some()
        || !options.validators.is_empty();
    if unsupported {
        return Err(SchemaError::InvalidField(format!(
            "Field `{}`: serializable fields only support hide_none and output_name",
            name
        )));
    }
    Ok(())
}

fn check_hide_flags(
    name: &str,
    variant: &FieldVariant,
    options: &FieldOptions,
) -> Result<(), SchemaError> {
    let unsupported_flag = |flag: &str| {
        SchemaError::InvalidField(format!(
            "Field `{}`: {} is not supported for {}",
            name,
            flag,
            variant.type_repr()
        ))
    };
    if options.hide_false && !matches!(variant, FieldVariant::Bool(_)) {
        return Err(unsupported_flag("hide_false"));
    }
    if options.hide_zero
        && !matches!(variant, FieldVariant::Int(_) | FieldVariant::Float(_))
    {
        return Err(unsupported_flag("hide_zero"));
    }
    if options.hide_empty
        && !matches!(
            variant,
            FieldVariant::Str(_)
                | FieldVariant::List(_)
                | FieldVariant::Map(_)
                | FieldVariant::Model(_)
        )
    {
        return Err(unsupported_flag("hide_empty"));
    }
    Ok(())
}

fn check_rule_options(
    name: &str,
    variant: &FieldVariant,
    options: &FieldOptions,
) -> Result<(), SchemaError> {
    let unsupported_option = |option: &str| {
        SchemaError::InvalidField(format!(
            "Field `{}`: {} is not supported for {}",
            name,
            option,
            variant.type_repr()
        ))
    };
    let numeric = matches!(variant, FieldVariant::Int(_) | FieldVariant::Float(_));
    if (options.min_value.is_some() || options.max_value.is_some()) && !numeric {
        return Err(unsupported_option("min_value/max_value"));
    }
    let sized = matches!(
        variant,
        FieldVariant::Str(_) | FieldVariant::List(_) | FieldVariant::Map(_)
    );
    if (options.min_length.is_some() || options.max_length.is_some()) && !sized {
        return Err(unsupported_option("min_length/max_length"));
    }
    if options.pattern.is_some() && !matches!(variant, FieldVariant::Str(_)) {
        return Err(unsupported_option("pattern"));
    }
    if options.choices.is_some() && !matches!(variant, FieldVariant::Str(_)) {
        return Err(unsupported_option("choices"));
    }
    Ok(())
}

fn apply_default(
    name: &str,
    variant: &mut FieldVariant,
    options: &FieldOptions,
) -> Result<(), SchemaError> {
    let default = match &options.default {
        None => {
            variant.common_mut().required = true;
            return Ok(());
        }
        Some(default) => default,
    };
    let compiled = match default {
        DeclaredDefault::Producer(producer) => FieldDefault::Producer(producer.clone()),
        DeclaredDefault::Literal(Json::Null) => {
            if !variant.common().allow_none {
                return Err(SchemaError::InvalidDefault(format!(
                    "Field `{}` is not Optional and cannot use None as default",
                    name
                )));
            }
            FieldDefault::Literal(Value::Null)
        }
        DeclaredDefault::Literal(literal) => {
            let value = literal_value(variant, literal).ok_or_else(|| {
                SchemaError::InvalidDefault(format!(
                    "Value `{}` used as field default must be of type {}",
                    literal,
                    variant.type_repr()
                ))
            })?;
            FieldDefault::Literal(value)
        }
    };
    let common = variant.common_mut();
    common.default = Some(compiled);
    common.required = false;
    Ok(())
}

/// Strict type check of a literal default against the field's semantic
/// type; no coercion happens here.
fn literal_value(variant: &FieldVariant, literal: &Json) -> Option<Value> {
    match (variant, literal) {
        (FieldVariant::Bool(_), Json::Bool(b)) => Some(Value::Bool(*b)),
        (FieldVariant::Int(_), Json::Number(n)) if !n.is_f64() => n.as_i64().map(Value::Int),
        (FieldVariant::Float(_), Json::Number(n)) if n.is_f64() => n.as_f64().map(Value::Float),
        (FieldVariant::Str(_), Json::String(s)) => Some(Value::Str(s.clone())),
        (FieldVariant::List(field), Json::Array(items)) => items
            .iter()
            .map(|item| literal_value(&field.item, item))
            .collect::<Option<Vec<Value>>>()
            .map(Value::List),
        (FieldVariant::Map(field), Json::Object(entries)) => entries
            .iter()
            .map(|(key, value)| literal_value(&field.value, value).map(|v| (key.clone(), v)))
            .collect::<Option<indexmap::IndexMap<String, Value>>>()
            .map(Value::Map),
        (FieldVariant::Any(_), literal) => Some(Value::Any(literal.clone())),
        _ => None,
    }
}

fn compose_roles(
    schema_name: &str,
    parent: Option<&Schema>,
    requested: &[RoleDef],
    all_field_names: &HashSet<String>,
    own_field_names: &HashSet<String>,
) -> Result<Vec<FinalizedRole>, SchemaError> {
    let mut requested_by_code: HashMap<usize, &RoleDef> = HashMap::new();
    for request in requested {
        for field in &request.fields {
            if !all_field_names.contains(field) {
                return Err(SchemaError::InvalidRole(format!(
                    "Role {} for {} references unknown field `{}`",
                    request.role.name(),
                    schema_name,
                    field
                )));
            }
        }
        if requested_by_code
            .insert(request.role.code(), request)
            .is_some()
        {
            return Err(SchemaError::InvalidRole(format!(
                "Role {} configured for {} multiple times",
                request.role.name(),
                schema_name
            )));
        }
    }

    // Ancestor roles first, newly requested roles after, each exactly once.
    let mut role_order: Vec<Role> = Vec::new();
    if let Some(parent) = parent {
        for finalized in &parent.roles {
            role_order.push(finalized.role);
        }
    }
    for request in requested {
        if !role_order.contains(&request.role) {
            role_order.push(request.role);
        }
    }

    let parent_roles: HashMap<usize, &FinalizedRole> = parent
        .map(|p| p.roles.iter().map(|r| (r.role.code(), r)).collect())
        .unwrap_or_default();
    let parent_field_names: HashSet<String> = parent
        .map(|p| p.fields.keys().cloned().collect())
        .unwrap_or_default();

    let mut finalized_roles = Vec::with_capacity(role_order.len());
    for role in role_order {
        let mut finalized = match parent_roles.get(&role.code()) {
            Some(parent_finalized) => FinalizedRole {
                role,
                fields: parent_finalized.fields.clone(),
            },
            None => FinalizedRole {
                role,
                fields: if parent.is_some() && !role.empty_by_default() {
                    parent_field_names.clone()
                } else {
                    HashSet::new()
                },
            },
        };
        match requested_by_code.get(&role.code()) {
            Some(request) => {
                finalized.apply_requested(request, all_field_names, own_field_names)
            }
            None => {
                if !role.empty_by_default() {
                    finalized.fields.extend(own_field_names.iter().cloned());
                }
            }
        }
        finalized_roles.push(finalized);
    }
    Ok(finalized_roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builder::{FieldDef, ModelDef};
    use serde_json::json;

    fn compile_def(def: ModelDef) -> Result<Schema, SchemaError> {
        let registry = SchemaRegistry::new();
        compile(&def, &registry)
    }

    #[test]
    fn test_compiles_fields_in_order() {
        let schema = compile_def(
            ModelDef::new("Employee")
                .field("name", FieldDef::str_())
                .field("salary", FieldDef::float().default(42.0).min_value(42.0)),
        )
        .unwrap();
        let names: Vec<&str> = schema.fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["name", "salary"]);
        assert!(schema.fields["name"].common().required);
        assert!(!schema.fields["salary"].common().required);
    }

    #[test]
    fn test_rejects_rule_options_on_wrong_type() {
        let err = compile_def(
            ModelDef::new("Bad").field("flag", FieldDef::bool_().min_value(1.0)),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));

        let err = compile_def(
            ModelDef::new("Bad").field("count", FieldDef::int().pattern("[0-9]+")),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_hide_flag_on_wrong_type() {
        let err = compile_def(
            ModelDef::new("Bad").field("name", FieldDef::str_().hide_zero()),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_combined_string_rules() {
        let err = compile_def(ModelDef::new("Bad").field(
            "code",
            FieldDef::str_().min_length(2).choices(&["a", "b"]),
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_mistyped_default() {
        let err = compile_def(
            ModelDef::new("Bad").field("salary", FieldDef::float().default(json!("lots"))),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault(_)));

        let err = compile_def(
            ModelDef::new("Bad").field("name", FieldDef::str_().default(json!(null))),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault(_)));
    }

    #[test]
    fn test_null_default_needs_allow_none() {
        let schema = compile_def(
            ModelDef::new("Ok").field(
                "nick",
                FieldDef::str_().allow_none().default(json!(null)),
            ),
        )
        .unwrap();
        assert!(!schema.fields["nick"].common().required);
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let err = compile_def(
            ModelDef::new("Bad").field("code", FieldDef::str_().pattern("(unclosed")),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let err = compile_def(
            ModelDef::new("Bad")
                .field("x", FieldDef::int())
                .field("x", FieldDef::str_()),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_default_on_element() {
        let err = compile_def(ModelDef::new("Bad").field(
            "tags",
            FieldDef::list(FieldDef::str_().default(json!("x"))),
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_rejects_non_str_map_key() {
        let err = compile_def(ModelDef::new("Bad").field(
            "index",
            FieldDef::map_keyed(FieldDef::int(), FieldDef::str_()),
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_role_on_unknown_field() {
        let role = Role::new("resolver_unknown_field");
        let err = compile_def(
            ModelDef::new("Bad")
                .field("a", FieldDef::int().default(0))
                .role(role.blacklist(&["missing"])),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRole(_)));
    }

    #[test]
    fn test_role_declared_twice() {
        let role = Role::new("resolver_twice");
        let err = compile_def(
            ModelDef::new("Bad")
                .field("a", FieldDef::int().default(0))
                .role(role.blacklist(&["a"]))
                .role(role.whitelist(&["a"])),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRole(_)));
    }

    #[test]
    fn test_int_bounds_must_be_whole() {
        let err = compile_def(
            ModelDef::new("Bad").field("n", FieldDef::int().min_value(1.5)),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(_)));
    }

    #[test]
    fn test_input_name_renames_output_too() {
        let schema = compile_def(
            ModelDef::new("Renamed")
                .field("internal", FieldDef::str_().input_name("external")),
        )
        .unwrap();
        let field = &schema.fields["internal"];
        assert_eq!(field.input_name(), Some("external"));
        assert_eq!(field.output_name(), Some("external"));
    }
}
