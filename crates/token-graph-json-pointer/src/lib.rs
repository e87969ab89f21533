//! JSON Pointer (RFC 6901) utilities for design token documents.
//!
//! Token documents reuse sibling values through local references of the form
//! `{"$ref": "#/colors/blue/$value/components/0"}`. This crate parses those
//! URI-fragment pointers, walks them through a raw `serde_json::Value`, and
//! recognizes `$ref` objects.
//!
//! # Example
//!
//! ```
//! use token_graph_json_pointer::{as_local_ref, find_by_fragment};
//!
//! let doc = serde_json::json!({"colors": {"$value": 42}, "copy": {"$ref": "#/colors/$value"}});
//! let target = as_local_ref(&doc["copy"]).unwrap();
//! assert_eq!(find_by_fragment(&doc, target).unwrap(), &serde_json::json!(42));
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod fragment;
pub use fragment::{as_local_ref, find_by_fragment, parse_fragment, REF_KEY};

pub mod validate;
pub use validate::validate_json_pointer;
use validate::array_index;

/// A JSON Pointer path: one unescaped string per step.
pub type Path = Vec<String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("pointer target not found: {0}")]
    NotFound(String),
    #[error("invalid array index `{0}`")]
    InvalidIndex(String),
    #[error("pointer must start with `/`: {0}")]
    PointerInvalid(String),
    #[error("fragment pointer must start with `#`: {0}")]
    FragmentInvalid(String),
    #[error("external reference `{0}` cannot be followed")]
    External(String),
    #[error("invalid percent-encoding in `{0}`")]
    PercentEncoding(String),
}

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// ```
/// use token_graph_json_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 before ~0, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// ```
/// use token_graph_json_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into unescaped path components.
///
/// The empty string is the root; the leading `/` is stripped.
///
/// ```
/// use token_graph_json_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/"), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    match pointer.strip_prefix('/') {
        Some(rest) => rest.split('/').map(unescape_component).collect(),
        None if pointer.is_empty() => Vec::new(),
        None => pointer.split('/').map(unescape_component).collect(),
    }
}

/// Format path components into a JSON Pointer string.
///
/// ```
/// use token_graph_json_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer::<String>(&[]), "");
/// assert_eq!(format_json_pointer(&["colors", "a/b"]), "/colors/a~1b");
/// ```
pub fn format_json_pointer<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component.as_ref()));
    }
    out
}

/// Walk `path` through `val`, reporting the first step that fails.
pub fn find<'a, S: AsRef<str>>(val: &'a Value, path: &[S]) -> Result<&'a Value, JsonPointerError> {
    let mut current = val;
    for (depth, step) in path.iter().enumerate() {
        let step = step.as_ref();
        current = match current {
            Value::Array(arr) => arr
                .get(array_index(step)?)
                .ok_or_else(|| JsonPointerError::NotFound(format_json_pointer(&path[..=depth])))?,
            Value::Object(map) => map
                .get(step)
                .ok_or_else(|| JsonPointerError::NotFound(format_json_pointer(&path[..=depth])))?,
            _ => return Err(JsonPointerError::NotFound(format_json_pointer(&path[..=depth]))),
        };
    }
    Ok(current)
}
