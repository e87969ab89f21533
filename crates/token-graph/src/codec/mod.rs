//! Document codecs.
//!
//! | Module       | Format                                                     |
//! |--------------|------------------------------------------------------------|
//! | [`tree`]     | nested single-tree token document (`$type`, `$value`, ...) |
//! | [`resolver`] | 2025.10 resolver document (`resolutionOrder` of sets/modifiers) |
//!
//! Parsing never fails: invalid pieces are dropped and reported as
//! [`ParseError`]s while everything else is kept. Serialization returns a
//! `Result` because an id-form alias must name an existing token.

pub mod pointer;
pub mod resolver;
pub mod tree;
pub mod value;

use std::fmt;

use thiserror::Error;
use token_graph_json_pointer::format_json_pointer;

use crate::model::{Node, NodeId};

/// Prefix of every reserved key.
pub const META_PREFIX: char = '$';

pub const KEY_TYPE: &str = "$type";
pub const KEY_VALUE: &str = "$value";
pub const KEY_DESCRIPTION: &str = "$description";
pub const KEY_DEPRECATED: &str = "$deprecated";
pub const KEY_EXTENSIONS: &str = "$extensions";
pub const KEY_SCHEMA: &str = "$schema";

// ── Errors ────────────────────────────────────────────────────────────────

/// A non-fatal problem found while parsing.
///
/// `path` is a JSON Pointer into the raw input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub path: String,
    pub message: String,
}

impl ParseError {
    pub fn new<S: AsRef<str>>(path: &[S], message: impl Into<String>) -> Self {
        Self { path: format_json_pointer(path), message: message.into() }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializeError {
    #[error("alias {alias} on `{token}` points at missing token")]
    DanglingReference { token: String, alias: String },
    #[error("node `{0}` cannot appear at the document root")]
    StrayNode(String),
}

// ── Results and options ───────────────────────────────────────────────────

/// Flat node list plus accumulated errors.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub nodes: Vec<Node>,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Replace `{"$ref": "#/..."}` objects inside `$value` before validation.
    pub substitute_pointers: bool,
    /// Check every alias against the parsed nodes and report failures.
    pub validate_references: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { substitute_pointers: true, validate_references: true }
    }
}

#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Omit a `$type` that equals the type inherited from the nearest ancestor.
    pub minimal_types: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { minimal_types: true }
    }
}

// ── Id assignment ─────────────────────────────────────────────────────────

/// Supplies ids for parsed nodes.
///
/// `path` holds the names from the document root down to the node,
/// including set, modifier and context names for resolver documents.
pub trait IdGenerator {
    fn next_id(&mut self, path: &[String]) -> NodeId;
}

/// `<prefix>1`, `<prefix>2`, ... in parse order.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: 1 }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("n")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, _path: &[String]) -> NodeId {
        let id = NodeId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// Deterministic ids: the node's name path as a JSON Pointer.
///
/// Sibling names are unique within a document, so ids are too.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIds;

impl IdGenerator for PathIds {
    fn next_id(&mut self, path: &[String]) -> NodeId {
        NodeId::new(format_json_pointer(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new("t");
        assert_eq!(ids.next_id(&[]).as_str(), "t1");
        assert_eq!(ids.next_id(&["x".into()]).as_str(), "t2");
    }

    #[test]
    fn path_ids_escape_separators() {
        let mut ids = PathIds;
        let id = ids.next_id(&["a/b".to_string(), "c".to_string()]);
        assert_eq!(id.as_str(), "/a~1b/c");
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::new(&["colors", "primary"], "bad");
        assert_eq!(err.to_string(), "/colors/primary: bad");
        assert_eq!(ParseError::new::<&str>(&[], "bad root").to_string(), "bad root");
    }
}
