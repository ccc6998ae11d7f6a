//! Shared schema fixtures for integration tests.
#![allow(dead_code)]

use typefold::{FieldDef, ModelDef, SchemaRegistry};

/// Captures engine logs in test output.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Employee with a required name and a bounded, defaulted salary.
pub fn employee_registry() -> SchemaRegistry {
    init_logging();
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Employee")
                .field("name", FieldDef::str_())
                .field("salary", FieldDef::float().default(42.0).min_value(42.0)),
        )
        .unwrap();
    registry
}

/// Company holding a nested required Address.
pub fn company_registry() -> SchemaRegistry {
    init_logging();
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Address")
                .field("city", FieldDef::str_())
                .field(
                    "zip",
                    FieldDef::str_()
                        .allow_none()
                        .default(serde_json::Value::Null)
                        .hide_none(),
                ),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Company")
                .field("name", FieldDef::str_())
                .field("address", FieldDef::model("Address")),
        )
        .unwrap();
    registry
}

/// Canvas holding a discriminated union of shapes.
pub fn shapes_registry() -> SchemaRegistry {
    init_logging();
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Circle")
                .type_name("circle")
                .field("radius", FieldDef::float()),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Square")
                .type_name("square")
                .field("side", FieldDef::float()),
        )
        .unwrap();
    registry
        .register(
            ModelDef::new("Canvas")
                .field("name", FieldDef::str_().default("untitled"))
                .field("shape", FieldDef::one_of(&["Circle", "Square"])),
        )
        .unwrap();
    registry
}

/// Self-referential tree node.
pub fn tree_registry() -> SchemaRegistry {
    init_logging();
    let registry = SchemaRegistry::new();
    registry
        .register(
            ModelDef::new("Node")
                .field("name", FieldDef::str_())
                .field(
                    "children",
                    FieldDef::list(FieldDef::model("Node")).default(serde_json::json!([])),
                ),
        )
        .unwrap();
    registry
}
