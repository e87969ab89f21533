//! `$ref` substitution inside token values.
//!
//! A `{"$ref": "#/path"}` object anywhere under a `$value` is replaced by a
//! copy of the value it points at in the same raw document. Targets may hold
//! further references; those are followed too. A token whose value cannot be
//! substituted is removed from the returned document and reported once.

use serde_json::Value;
use token_graph_json_pointer::{as_local_ref, find_by_fragment};

use super::{ParseError, KEY_VALUE, META_PREFIX};
use crate::model::ROOT_TOKEN_NAME;

/// Returns a copy of `doc` with every `$value` pointer replaced.
///
/// `base` prefixes the JSON Pointer of each reported error.
pub fn substitute_pointers(doc: &Value, base: &[String], errors: &mut Vec<ParseError>) -> Value {
    let mut out = doc.clone();
    let mut path = base.to_vec();
    walk(&mut out, doc, &mut path, errors);
    out
}

/// Returns `false` when the node at `path` is a token that must be dropped.
fn walk(node: &mut Value, root: &Value, path: &mut Vec<String>, errors: &mut Vec<ParseError>) -> bool {
    let Value::Object(map) = node else {
        return true;
    };
    if let Some(raw) = map.get(KEY_VALUE) {
        let mut chain = Vec::new();
        match substitute(raw, root, &mut chain) {
            Ok(Some(value)) => {
                map.insert(KEY_VALUE.to_string(), value);
            }
            Ok(None) => {}
            Err(message) => {
                path.push(KEY_VALUE.to_string());
                let error = ParseError::new(path.as_slice(), message);
                path.pop();
                tracing::debug!(path = %error.path, "dropping token with unresolvable $ref");
                errors.push(error);
                return false;
            }
        }
    }

    let mut dropped = Vec::new();
    for (key, child) in map.iter_mut() {
        if key.starts_with(META_PREFIX) && key != ROOT_TOKEN_NAME {
            continue;
        }
        path.push(key.clone());
        if !walk(child, root, path, errors) {
            dropped.push(key.clone());
        }
        path.pop();
    }
    for key in dropped {
        map.shift_remove(&key);
    }
    true
}

/// `Ok(None)` when `value` holds no reference.
fn substitute(value: &Value, root: &Value, chain: &mut Vec<String>) -> Result<Option<Value>, String> {
    if let Some(target) = as_local_ref(value) {
        if chain.iter().any(|seen| seen == target) {
            chain.push(target.to_string());
            return Err(format!("circular $ref: {}", chain.join(" -> ")));
        }
        let found = find_by_fragment(root, target).map_err(|e| format!("cannot resolve $ref `{target}`: {e}"))?;
        chain.push(target.to_string());
        let resolved = substitute(found, root, chain)?.unwrap_or_else(|| found.clone());
        chain.pop();
        return Ok(Some(resolved));
    }
    match value {
        Value::Object(map) => {
            let mut changed = false;
            let mut out = map.clone();
            for (key, child) in map {
                if let Some(v) = substitute(child, root, chain)? {
                    out.insert(key.clone(), v);
                    changed = true;
                }
            }
            Ok(changed.then_some(Value::Object(out)))
        }
        Value::Array(items) => {
            let mut changed = false;
            let mut out = items.clone();
            for (i, item) in items.iter().enumerate() {
                if let Some(v) = substitute(item, root, chain)? {
                    out[i] = v;
                    changed = true;
                }
            }
            Ok(changed.then_some(Value::Array(out)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(doc: Value) -> (Value, Vec<ParseError>) {
        let mut errors = Vec::new();
        let out = substitute_pointers(&doc, &[], &mut errors);
        (out, errors)
    }

    #[test]
    fn replaces_nested_component_reference() {
        let (out, errors) = run(json!({
            "base": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1, 0.5, 0]}},
            "accent": {"$type": "color", "$value": {
                "colorSpace": "srgb",
                "components": [{"$ref": "#/base/$value/components/0"}, 0, 0]
            }}
        }));
        assert!(errors.is_empty());
        assert_eq!(out["accent"]["$value"]["components"], json!([1, 0, 0]));
    }

    #[test]
    fn follows_reference_chains() {
        let (out, errors) = run(json!({
            "a": {"$type": "number", "$value": 4},
            "b": {"$type": "number", "$value": {"$ref": "#/a/$value"}},
            "c": {"$type": "number", "$value": {"$ref": "#/b/$value"}}
        }));
        assert!(errors.is_empty());
        assert_eq!(out["c"]["$value"], json!(4));
    }

    #[test]
    fn missing_target_drops_token_and_reports() {
        let (out, errors) = run(json!({
            "g": {"bad": {"$type": "number", "$value": {"$ref": "#/nope"}}, "ok": {"$type": "number", "$value": 1}}
        }));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/g/bad/$value");
        assert!(out["g"].get("bad").is_none());
        assert_eq!(out["g"]["ok"]["$value"], json!(1));
    }

    #[test]
    fn circular_pointer_is_reported() {
        let (_, errors) = run(json!({
            "a": {"$type": "number", "$value": {"$ref": "#/b/$value"}},
            "b": {"$type": "number", "$value": {"$ref": "#/a/$value"}}
        }));
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("circular"));
    }

    #[test]
    fn refs_outside_values_are_left_alone() {
        let doc = json!({"$extensions": {"x": {"$ref": "#/missing"}}, "t": {"$type": "number", "$value": 1}});
        let (out, errors) = run(doc.clone());
        assert!(errors.is_empty());
        assert_eq!(out, doc);
    }
}
