//! Helpers behind the `token-resolve` and `token-normalize` binaries.
//!
//! Both take a whole JSON document as text, detect whether it is a
//! single-tree or a resolver document, and return the output document along
//! with every parse error.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::codec::resolver::{parse_resolver, serialize_resolver};
use crate::codec::tree::{parse, serialize};
use crate::codec::value::literal_to_json;
use crate::codec::{ParseError, SequentialIds, SerializeError};
use crate::model::{Meta, Node, ResolverMeta};
use crate::resolve::ValueResolver;
use crate::store::NodeStore;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

// ── Formats ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Tree,
    Resolver,
}

/// A document with a `resolutionOrder` key is a resolver document.
pub fn detect_format(doc: &Value) -> Format {
    match doc.get("resolutionOrder") {
        Some(_) => Format::Resolver,
        None => Format::Tree,
    }
}

/// Output document plus the errors met while parsing the input.
#[derive(Debug)]
pub struct CliOutput {
    pub document: Value,
    pub errors: Vec<ParseError>,
}

fn load(json: &str) -> Result<(Format, NodeStore, ResolverMeta, Vec<ParseError>), CliError> {
    let doc: Value = serde_json::from_str(json)?;
    let format = detect_format(&doc);
    let mut ids = SequentialIds::default();
    let (nodes, meta, errors) = match format {
        Format::Tree => {
            let out = parse(&doc, &mut ids);
            (out.nodes, ResolverMeta::default(), out.errors)
        }
        Format::Resolver => {
            let out = parse_resolver(&doc, &mut ids);
            (out.nodes, out.meta, out.errors)
        }
    };
    Ok((format, NodeStore::from_nodes(nodes), meta, errors))
}

// ── token-resolve ─────────────────────────────────────────────────────────

/// Resolve every token: `{"<name>": {"type": ..., "value": ...}}`, or
/// `{"<name>": {"error": ...}}` for a token that does not resolve.
///
/// Tokens inside sets and modifier contexts are named
/// `<container>/.../<dotted.path>`.
pub fn resolve_document(json: &str) -> Result<CliOutput, CliError> {
    let (_, store, _, errors) = load(json)?;
    let resolver = ValueResolver::new(&store);
    let mut out = Map::new();
    for (id, result) in resolver.resolve_tokens() {
        let Some(node) = store.get_node(id) else { continue };
        let mut entry = Map::new();
        match result {
            Ok(token) => {
                entry.insert("type".into(), token.token_type.as_str().into());
                entry.insert("value".into(), literal_to_json(&token.value));
            }
            Err(e) => {
                entry.insert("error".into(), e.to_string().into());
            }
        }
        out.insert(qualified_name(&resolver, node), Value::Object(entry));
    }
    Ok(CliOutput { document: Value::Object(out), errors })
}

fn qualified_name(resolver: &ValueResolver<'_>, node: &Node) -> String {
    let path = resolver.token_path(&node.id).unwrap_or_else(|| node.id.to_string());
    let mut containers: Vec<&str> = resolver
        .store()
        .ancestors(&node.id)
        .filter(|a| matches!(a.meta, Meta::Set(_) | Meta::Modifier(_) | Meta::ModifierContext(_)))
        .map(Node::name)
        .collect();
    if containers.is_empty() {
        return path;
    }
    containers.reverse();
    format!("{}/{path}", containers.join("/"))
}

// ── token-normalize ───────────────────────────────────────────────────────

/// Parse and write the document back in canonical form.
pub fn normalize_document(json: &str) -> Result<CliOutput, CliError> {
    let (format, store, meta, errors) = load(json)?;
    let document = match format {
        Format::Tree => serialize(&store)?,
        Format::Resolver => serialize_resolver(&store, Some(&meta))?,
    };
    Ok(CliOutput { document, errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_resolver_documents() {
        assert_eq!(detect_format(&json!({"version": "2025.10", "resolutionOrder": []})), Format::Resolver);
        assert_eq!(detect_format(&json!({"colors": {}})), Format::Tree);
    }

    #[test]
    fn resolve_names_tokens_by_path() {
        let input = r#"{
            "colors": {"$type": "color", "blue": {"$value": {"colorSpace": "srgb", "components": [0, 0, 1]}}},
            "brand": {"$value": "{colors.blue}"},
            "broken": {"$value": "{colors.red}"}
        }"#;
        let out = resolve_document(input).unwrap();
        assert_eq!(out.document["colors.blue"]["type"], json!("color"));
        assert_eq!(out.document["brand"]["value"], json!({"colorSpace": "srgb", "components": [0, 0, 1]}));
        assert_eq!(out.document["broken"]["error"], json!("unresolved reference {colors.red}"));
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn resolve_prefixes_container_names() {
        let input = r#"{
            "version": "2025.10",
            "resolutionOrder": [
                {"type": "set", "name": "base", "sources": [{"n": {"$type": "number", "$value": 1}}]},
                {"type": "modifier", "name": "mode", "contexts": {"dense": [{"n": {"$type": "number", "$value": 2}}]}}
            ]
        }"#;
        let out = resolve_document(input).unwrap();
        assert_eq!(out.document["base/n"]["value"], json!(1));
        assert_eq!(out.document["mode/dense/n"]["value"], json!(2));
    }

    #[test]
    fn normalize_adds_root_token_form() {
        let input = r#"{"accent": {"$type": "number", "$value": 1, "soft": {"$value": 2}}}"#;
        let out = normalize_document(input).unwrap();
        assert!(out.errors.is_empty());
        assert_eq!(
            out.document,
            json!({"accent": {"$type": "number", "$root": {"$value": 1}, "soft": {"$value": 2}}})
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(resolve_document("{"), Err(CliError::Json(_))));
    }
}
