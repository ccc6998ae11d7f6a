//! Error types for the schema system.
//!
//! Three kinds of failure are kept apart:
//! - [`SchemaError`]: a structure type is declared inconsistently. Fatal at
//!   schema resolution time, surfaced on first use of the type, never
//!   recoverable per-instance.
//! - [`ConversionError`]: primitive input could not be converted. Carries the
//!   full [`ErrorTree`]; no partially converted instance escapes.
//! - [`ValidationError`]: a converted instance failed validation rules. The
//!   validation pass itself only returns an [`ErrorTree`]; this error exists
//!   for callers that want absence-of-errors enforced.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Key used for messages that attach to the whole structure rather than a
/// specific field, and for parent-level messages on a key that also carries
/// a nested tree.
pub const GLOBAL_KEY: &str = "_global";

/// Configuration error raised while resolving a structure type's schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema not found: {0}")]
    NotFound(String),
    #[error("Schema already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Invalid default: {0}")]
    InvalidDefault(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid discriminator: {0}")]
    InvalidDiscriminator(String),
    #[error("Circular inheritance: {0}")]
    CircularInheritance(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A single error message with the path of the field it belongs to. An empty
/// path means the message concerns the structure as a whole.
pub type PathError = (Vec<String>, String);

/// Nested mapping of error messages mirroring the structure's field layout.
///
/// Leaf fields map to message lists; nested structures and compound fields
/// map to nested trees keyed by field name or stringified index/key. An
/// empty tree means "no error".
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ErrorTree {
    entries: IndexMap<String, ErrorNode>,
}

/// One entry of an [`ErrorTree`]: either messages for a leaf field or a
/// nested tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Messages(Vec<String>),
    Nested(ErrorTree),
}

impl ErrorTree {
    /// Builds the nested tree from flat path/message pairs. Root-level
    /// messages (empty paths) nest under [`GLOBAL_KEY`]; a key holding
    /// messages that later also needs a subtree keeps the messages under
    /// [`GLOBAL_KEY`] inside that subtree.
    pub fn from_path_errors(errors: &[PathError]) -> Self {
        let mut tree = ErrorTree::default();
        for (path, message) in errors {
            if path.is_empty() {
                tree.push_message(&[GLOBAL_KEY.to_string()], message);
            } else {
                tree.push_message(path, message);
            }
        }
        tree
    }

    fn push_message(&mut self, path: &[String], message: &str) {
        let (head, rest) = match path.split_first() {
            Some(split) => split,
            None => return,
        };
        if rest.is_empty() {
            match self
                .entries
                .entry(head.clone())
                .or_insert_with(|| ErrorNode::Messages(Vec::new()))
            {
                ErrorNode::Messages(messages) => messages.push(message.to_string()),
                ErrorNode::Nested(nested) => {
                    nested.push_message(&[GLOBAL_KEY.to_string()], message)
                }
            }
        } else {
            let node = self
                .entries
                .entry(head.clone())
                .or_insert_with(|| ErrorNode::Nested(ErrorTree::default()));
            if let ErrorNode::Messages(messages) = node {
                let mut nested = ErrorTree::default();
                nested
                    .entries
                    .insert(GLOBAL_KEY.to_string(), ErrorNode::Messages(messages.clone()));
                *node = ErrorNode::Nested(nested);
            }
            if let ErrorNode::Nested(nested) = node {
                nested.push_message(rest, message);
            }
        }
    }

    /// True when no errors were recorded; the caller's sole way to
    /// distinguish "valid" from "invalid".
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        self.entries.get(key)
    }

    /// Messages recorded directly under the given key, if it is a leaf.
    pub fn messages(&self, key: &str) -> Option<&[String]> {
        match self.entries.get(key) {
            Some(ErrorNode::Messages(messages)) => Some(messages.as_slice()),
            _ => None,
        }
    }

    /// Nested tree recorded under the given key, if it is a branch.
    pub fn nested(&self, key: &str) -> Option<&ErrorTree> {
        match self.entries.get(key) {
            Some(ErrorNode::Nested(tree)) => Some(tree),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// The tree as primitive data, the wire form handed to callers.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => f.write_str("{}"),
        }
    }
}

fn first_error_line(errors: &[PathError]) -> String {
    match errors.first() {
        Some((path, message)) if path.is_empty() => message.clone(),
        Some((path, message)) => format!("{}: {}", path.join(": "), message),
        None => String::new(),
    }
}

/// Failure to convert primitive input into an instance: the root was not a
/// mapping, one or more fields could not be coerced, or a discriminator was
/// missing or unrecognized. Conversion is all-or-nothing; the error carries
/// every field's coercion problem.
#[derive(Debug, Clone)]
pub enum ConversionError {
    /// Field-level coercion failures, aggregated across all fields.
    Invalid { error_list: Vec<PathError> },
    /// A configuration error surfaced by lazy schema resolution.
    Schema(SchemaError),
}

impl ConversionError {
    pub(crate) fn new(error_list: Vec<PathError>) -> Self {
        ConversionError::Invalid { error_list }
    }

    /// The nested error tree, empty for configuration failures.
    pub fn errors(&self) -> ErrorTree {
        match self {
            ConversionError::Invalid { error_list } => ErrorTree::from_path_errors(error_list),
            ConversionError::Schema(_) => ErrorTree::default(),
        }
    }

    /// The flat path/message pairs, in field order.
    pub fn error_list(&self) -> &[PathError] {
        match self {
            ConversionError::Invalid { error_list } => error_list,
            ConversionError::Schema(_) => &[],
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Invalid { error_list } => f.write_str(&first_error_line(error_list)),
            ConversionError::Schema(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Schema(err) => Some(err),
            ConversionError::Invalid { .. } => None,
        }
    }
}

impl From<SchemaError> for ConversionError {
    fn from(err: SchemaError) -> Self {
        ConversionError::Schema(err)
    }
}

/// Failure of the validation pass, for callers that require an empty tree
/// before proceeding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    error_list: Vec<PathError>,
}

impl ValidationError {
    pub(crate) fn new(error_list: Vec<PathError>) -> Self {
        Self { error_list }
    }

    /// The nested error tree.
    pub fn errors(&self) -> ErrorTree {
        ErrorTree::from_path_errors(&self.error_list)
    }

    /// The flat path/message pairs, in field order.
    pub fn error_list(&self) -> &[PathError] {
        &self.error_list
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&first_error_line(&self.error_list))
    }
}

impl std::error::Error for ValidationError {}
