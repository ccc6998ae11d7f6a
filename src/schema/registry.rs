//! Process-wide schema registry.
//!
//! Structure types are registered as declarations and compiled into
//! immutable [`Schema`]s lazily, on first use. Resolution is memoized: the
//! registry hands out the same `Arc<Schema>` for a type name forever, so
//! descriptors bound through it stay referentially stable. Racing first
//! resolutions are harmless — compilation is pure and the first published
//! schema wins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::info;
use serde_json::Value as Json;

use crate::instance::value::Value;
use crate::instance::{convert, ModelInstance};
use crate::schema::builder::ModelDef;
use crate::schema::resolver;
use crate::schema::types::errors::{ConversionError, SchemaError};
use crate::schema::types::schema::Schema;

/// Registry of declared structure types and their compiled schemas.
pub struct SchemaRegistry {
    defs: Mutex<HashMap<String, ModelDef>>,
    schemas: Mutex<HashMap<String, Arc<Schema>>>,
}

thread_local! {
    // Names being compiled on this thread, to turn inheritance cycles into
    // configuration errors instead of unbounded recursion.
    static RESOLVING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            defs: Mutex::new(HashMap::new()),
            schemas: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a structure type declaration. Registration is cheap; the
    /// declaration is compiled on first use. Re-registering a name is a
    /// configuration error — published schemas must stay stable.
    pub fn register(&self, def: ModelDef) -> Result<(), SchemaError> {
        let mut defs = self
            .defs
            .lock()
            .map_err(|_| SchemaError::Internal("Failed to acquire registry lock".to_string()))?;
        if defs.contains_key(&def.name) {
            return Err(SchemaError::AlreadyRegistered(def.name.clone()));
        }
        info!("Registered schema declaration '{}'", def.name);
        defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Resolves a structure type to its compiled schema, compiling it on
    /// first use. Subsequent calls return the same handle.
    pub fn resolve(&self, name: &str) -> Result<Arc<Schema>, SchemaError> {
        {
            let schemas = self.schemas.lock().map_err(|_| {
                SchemaError::Internal("Failed to acquire registry lock".to_string())
            })?;
            if let Some(schema) = schemas.get(name) {
                return Ok(schema.clone());
            }
        }

        let def = {
            let defs = self.defs.lock().map_err(|_| {
                SchemaError::Internal("Failed to acquire registry lock".to_string())
            })?;
            defs.get(name)
                .cloned()
                .ok_or_else(|| SchemaError::NotFound(name.to_string()))?
        };

        let already_resolving = RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|n| n == name) {
                true
            } else {
                stack.push(name.to_string());
                false
            }
        });
        if already_resolving {
            return Err(SchemaError::CircularInheritance(format!(
                "{} is an ancestor of itself",
                name
            )));
        }
        let compiled = resolver::compile(&def, self);
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
        let schema = Arc::new(compiled?);

        let mut schemas = self
            .schemas
            .lock()
            .map_err(|_| SchemaError::Internal("Failed to acquire registry lock".to_string()))?;
        // First publish wins; a racing thread compiled an identical schema.
        let published = schemas
            .entry(name.to_string())
            .or_insert_with(|| {
                info!("Resolved schema '{}'", name);
                schema
            })
            .clone();
        Ok(published)
    }

    /// Whether a declaration with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.defs
            .lock()
            .map(|defs| defs.contains_key(name))
            .unwrap_or(false)
    }

    /// Names of all registered structure types.
    pub fn schema_names(&self) -> Vec<String> {
        self.defs
            .lock()
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Converts primitive input into an instance of the named structure
    /// type. Conversion is all-or-nothing: every field's coercion problem
    /// is collected into the error before failing.
    pub fn convert(&self, name: &str, input: &Json) -> Result<ModelInstance, ConversionError> {
        let schema = self.resolve(name)?;
        convert::convert_model(self, &schema, input)
    }

    /// Creates an instance programmatically: defaults applied, required
    /// fields left `Missing`.
    pub fn new_instance(&self, name: &str) -> Result<ModelInstance, SchemaError> {
        let schema = self.resolve(name)?;
        let values = schema
            .fields
            .iter()
            .filter(|(_, field)| !field.is_serializable())
            .map(|(field_name, field)| {
                use crate::schema::types::field::Field;
                (field_name.clone(), field.common().fill_missing())
            })
            .collect::<indexmap::IndexMap<String, Value>>();
        Ok(ModelInstance::from_parts(schema, values))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
