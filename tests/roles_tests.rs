//! Role system and serialization shaping integration tests.

mod common;

use serde_json::json;
use typefold::{FieldDef, ModelDef, Role, SchemaRegistry, Value, DEFAULT_ROLE};

fn person_registry(role: Role) -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Person")
                .field("name", FieldDef::str_())
                .field("email", FieldDef::str_().default(""))
                .field("phone", FieldDef::str_().default(""))
                .field("notes", FieldDef::str_().default(""))
                .role(role.blacklist(&["email", "phone"])),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Employee")
                .parent("Person")
                .field("salary", FieldDef::float().default(42.0))
                .role(role.blacklist(&["salary"])),
        )
        .unwrap();
    registry
}

#[test]
fn test_role_inheritance_excludes_composed_blacklists() {
    let private = Role::new("private_inheritance");
    let registry = person_registry(private);

    let employee = registry
        .convert(
            "Employee",
            &json!({
                "name": "Ada",
                "email": "ada@example.com",
                "phone": "555",
                "notes": "vip",
                "salary": 99.0,
            }),
        )
        .unwrap();

    // Base blacklists two fields, the subtype one more: exactly three gone.
    assert_eq!(
        employee.to_primitive(private),
        json!({"name": "Ada", "notes": "vip"})
    );
    // The default role still carries everything.
    assert_eq!(
        employee.to_primitive(DEFAULT_ROLE),
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "555",
            "notes": "vip",
            "salary": 99.0,
        })
    );
}

#[test]
fn test_whitelist_role() {
    let public = Role::new("public_whitelist");
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Account")
                .field("user", FieldDef::str_())
                .field("token", FieldDef::str_())
                .role(public.whitelist(&["user"])),
        )
        .unwrap();

    let account = registry
        .convert("Account", &json!({"user": "ada", "token": "s3cr3t"}))
        .unwrap();
    assert_eq!(account.to_primitive(public), json!({"user": "ada"}));
}

#[test]
fn test_override_parents_resets_inherited_rules() {
    let slim = Role::new("slim_override");
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Base")
                .field("a", FieldDef::int().default(1))
                .field("b", FieldDef::int().default(2))
                .role(slim.blacklist(&["a"])),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Child")
                .parent("Base")
                .field("c", FieldDef::int().default(3))
                .role(slim.whitelist(&["a"]).override_parents()),
        )
        .unwrap();

    let child = registry.convert("Child", &json!({})).unwrap();
    // The whitelist override hides even inherited fields unless listed.
    assert_eq!(child.to_primitive(slim), json!({"a": 1}));
}

#[test]
fn test_empty_by_default_role() {
    let minimal = Role::new_empty_by_default("minimal_empty");
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Opted")
                .field("shown", FieldDef::int().default(1))
                .field("hidden", FieldDef::int().default(2))
                .role(minimal.whitelist(&["shown"])),
        )
        .unwrap();
    registry
        .register(ModelDef::new("Unaware").field("x", FieldDef::int().default(9)))
        .unwrap();

    let opted = registry.convert("Opted", &json!({})).unwrap();
    assert_eq!(opted.to_primitive(minimal), json!({"shown": 1}));

    // Types that never configured the role serialize empty under it.
    let unaware = registry.convert("Unaware", &json!({})).unwrap();
    assert_eq!(unaware.to_primitive(minimal), json!({}));
}

#[test]
fn test_role_propagates_into_nested_structures() {
    let terse = Role::new("terse_nested");
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Address")
                .field("city", FieldDef::str_())
                .field("zip", FieldDef::str_().default(""))
                .role(terse.blacklist(&["zip"])),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Company")
                .field("name", FieldDef::str_())
                .field("address", FieldDef::model("Address")),
        )
        .unwrap();

    let company = registry
        .convert(
            "Company",
            &json!({"name": "Initech", "address": {"city": "Austin", "zip": "73301"}}),
        )
        .unwrap();
    assert_eq!(
        company.to_primitive(terse),
        json!({"name": "Initech", "address": {"city": "Austin"}})
    );
}

#[test]
fn test_hide_flags() {
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Hidden")
                .field("flag", FieldDef::bool_().default(false).hide_false())
                .field("count", FieldDef::int().default(0).hide_zero())
                .field("ratio", FieldDef::float().default(0.0).hide_zero())
                .field("label", FieldDef::str_().default("").hide_empty())
                .field(
                    "tags",
                    FieldDef::list(FieldDef::str_()).default(json!([])).hide_empty(),
                )
                .field(
                    "nick",
                    FieldDef::str_().allow_none().default(json!(null)).hide_none(),
                ),
        )
        .unwrap();

    let empty = registry.convert("Hidden", &json!({})).unwrap();
    assert_eq!(empty.serialize(), json!({}));

    let filled = registry
        .convert(
            "Hidden",
            &json!({
                "flag": true,
                "count": 2,
                "ratio": 0.5,
                "label": "x",
                "tags": ["a"],
                "nick": "n",
            }),
        )
        .unwrap();
    assert_eq!(
        filled.serialize(),
        json!({
            "flag": true,
            "count": 2,
            "ratio": 0.5,
            "label": "x",
            "tags": ["a"],
            "nick": "n",
        })
    );
}

#[test]
fn test_output_naming() {
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Named")
                .field("value", FieldDef::int().output_name("renamed"))
                .field("secret", FieldDef::int().default(0).no_output()),
        )
        .unwrap();

    let instance = registry
        .convert("Named", &json!({"value": 3, "secret": 9}))
        .unwrap();
    assert_eq!(instance.serialize(), json!({"renamed": 3}));
}

#[test]
fn test_serializable_fields() {
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Rect")
                .field("width", FieldDef::float())
                .field("height", FieldDef::float())
                .field(
                    "area",
                    FieldDef::computed(|instance| {
                        match (
                            instance.get("width").and_then(Value::as_float),
                            instance.get("height").and_then(Value::as_float),
                        ) {
                            (Some(width), Some(height)) => Value::Float(width * height),
                            _ => Value::Null,
                        }
                    })
                    .hide_none(),
                ),
        )
        .unwrap();

    let rect = registry
        .convert("Rect", &json!({"width": 3, "height": 4}))
        .unwrap();
    // Computed fields never take part in conversion or validation.
    assert_eq!(rect.get("area"), None);
    assert!(rect.validation_errors(None).is_empty());
    assert_eq!(
        rect.serialize(),
        json!({"width": 3.0, "height": 4.0, "area": 12.0})
    );

    let incomplete = registry.convert("Rect", &json!({"width": 3})).unwrap();
    // hide_none drops the computed key when the accessor yields null.
    assert_eq!(incomplete.serialize(), json!({"width": 3.0}));
}

#[test]
fn test_fields_for_role() {
    let listing = Role::new("listing_names");
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Entry")
                .field("id", FieldDef::int())
                .field("body", FieldDef::str_().default(""))
                .field("internal", FieldDef::str_().default("").no_output())
                .role(listing.blacklist(&["body"])),
        )
        .unwrap();

    let schema = registry.resolve("Entry").unwrap();
    assert_eq!(
        schema.field_names_for_role(DEFAULT_ROLE),
        vec!["id".to_string(), "body".to_string()]
    );
    assert_eq!(schema.field_names_for_role(listing), vec!["id".to_string()]);
}

#[test]
fn test_union_serialization_restores_tag() {
    let registry = common::shapes_registry();
    let canvas = registry
        .convert(
            "Canvas",
            &json!({"name": "art", "shape": {"type": "square", "side": 2}}),
        )
        .unwrap();
    assert_eq!(
        canvas.serialize(),
        json!({"name": "art", "shape": {"side": 2.0, "type": "square"}})
    );
}
