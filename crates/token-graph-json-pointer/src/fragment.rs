//! URI-fragment pointers (`#/a/b`) and `$ref` objects.
//!
//! A fragment pointer is a JSON Pointer prefixed with `#` whose components
//! may additionally be percent-encoded, as in RFC 6901 §6.

use serde_json::Value;

use crate::{find, parse_json_pointer, validate_json_pointer, JsonPointerError, Path};

/// Key marking a reference object.
pub const REF_KEY: &str = "$ref";

/// Returns the target of a `{"$ref": "<target>"}` object.
///
/// Only objects whose single key is `$ref` with a string value qualify, so a
/// token value that merely contains a `$ref` field next to real data is left
/// alone.
///
/// ```
/// use token_graph_json_pointer::as_local_ref;
/// use serde_json::json;
///
/// assert_eq!(as_local_ref(&json!({"$ref": "#/a"})), Some("#/a"));
/// assert_eq!(as_local_ref(&json!({"$ref": "#/a", "x": 1})), None);
/// assert_eq!(as_local_ref(&json!("#/a")), None);
/// ```
pub fn as_local_ref(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(REF_KEY)?.as_str()
}

/// Parse a `#/a/b` fragment into path components.
///
/// `#` alone addresses the document root. Anything before the `#` makes the
/// reference external, which this crate never follows.
///
/// ```
/// use token_graph_json_pointer::parse_fragment;
///
/// assert_eq!(parse_fragment("#").unwrap(), Vec::<String>::new());
/// assert_eq!(parse_fragment("#/a%20b/c~1d").unwrap(), vec!["a b", "c/d"]);
/// assert!(parse_fragment("other.json#/a").is_err());
/// ```
pub fn parse_fragment(reference: &str) -> Result<Path, JsonPointerError> {
    let pointer = match reference.split_once('#') {
        Some(("", pointer)) => pointer,
        Some(_) => return Err(JsonPointerError::External(reference.to_string())),
        None if reference.is_empty() => {
            return Err(JsonPointerError::FragmentInvalid(reference.to_string()))
        }
        None => return Err(JsonPointerError::External(reference.to_string())),
    };
    let decoded = urlencoding::decode(pointer)
        .map_err(|_| JsonPointerError::PercentEncoding(reference.to_string()))?;
    validate_json_pointer(&decoded)?;
    Ok(parse_json_pointer(&decoded))
}

/// Resolve a `#/...` fragment against `doc`.
pub fn find_by_fragment<'a>(doc: &'a Value, reference: &str) -> Result<&'a Value, JsonPointerError> {
    let path = parse_fragment(reference)?;
    find(doc, &path)
}
