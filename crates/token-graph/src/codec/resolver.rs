//! Resolver documents, version 2025.10.
//!
//! ```json
//! {
//!   "version": "2025.10",
//!   "name": "Acme",
//!   "resolutionOrder": [
//!     { "type": "set", "name": "base", "sources": [{ "colors": { ... } }] },
//!     {
//!       "type": "modifier",
//!       "name": "theme",
//!       "default": "light",
//!       "contexts": { "light": [{ ... }], "dark": [{ ... }] }
//!     }
//!   ]
//! }
//! ```
//!
//! Each set's sources (and each context's) are deep-merged in list order and
//! parsed as one single-tree document under a Set (or ModifierContext) node.
//! Aliases are checked only after every item is parsed, so a set may refer
//! to tokens of a set listed after it.

use std::collections::HashSet;

use serde_json::{Map, Value};
use token_graph_json_pointer::{as_local_ref, find_by_fragment};
use token_graph_util::deep_merge_all;
use tracing::debug;

use super::tree::{TreeParser, TreeWriter};
use super::{IdGenerator, ParseError, ParseOptions, SerializeError, SerializeOptions, KEY_VALUE, META_PREFIX};
use crate::model::{ContextMeta, Meta, ModifierMeta, Node, NodeId, ResolverMeta, SetMeta, ROOT_TOKEN_NAME};
use crate::order::n_keys_between;
use crate::store::NodeStore;

pub const RESOLVER_VERSION: &str = "2025.10";

/// Nodes and errors from [`parse_resolver`], plus the document's own name.
#[derive(Debug, Clone, Default)]
pub struct ResolverParseOutput {
    pub meta: ResolverMeta,
    pub nodes: Vec<Node>,
    pub errors: Vec<ParseError>,
}

impl ResolverParseOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fatal(path: &[&str], message: &str) -> Self {
        Self { errors: vec![ParseError::new(path, message)], ..Self::default() }
    }
}

/// Leaves of the source merge: a plain token replaces a plain token. A
/// group carrying its own `$value` is merged like any other group.
fn is_token_object(map: &Map<String, Value>) -> bool {
    map.contains_key(KEY_VALUE) && map.keys().all(|k| k.starts_with(META_PREFIX) && k != ROOT_TOKEN_NAME)
}

pub fn parse_resolver(doc: &Value, ids: &mut dyn IdGenerator) -> ResolverParseOutput {
    parse_resolver_with(doc, ids, &ParseOptions::default())
}

pub fn parse_resolver_with(doc: &Value, ids: &mut dyn IdGenerator, options: &ParseOptions) -> ResolverParseOutput {
    let Some(root) = doc.as_object() else {
        return ResolverParseOutput::fatal(&[], "resolver document must be an object");
    };
    match root.get("version") {
        Some(Value::String(v)) if v == RESOLVER_VERSION => {}
        Some(other) => {
            return ResolverParseOutput::fatal(
                &["version"],
                &format!("unsupported version {other}; expected \"{RESOLVER_VERSION}\""),
            )
        }
        None => return ResolverParseOutput::fatal(&["version"], "missing `version`"),
    }
    let Some(items) = root.get("resolutionOrder").and_then(Value::as_array) else {
        return ResolverParseOutput::fatal(&["resolutionOrder"], "`resolutionOrder` must be an array");
    };

    let mut meta = ResolverMeta::default();
    let mut parser = TreeParser::new(ids, options);
    match root.get("name") {
        None => {}
        Some(Value::String(name)) => meta.name = name.clone(),
        Some(_) => parser.error(&["name".to_string()], "`name` must be a string"),
    }
    match root.get("description") {
        None => {}
        Some(Value::String(d)) => meta.description = Some(d.clone()),
        Some(_) => parser.error(&["description".to_string()], "`description` must be a string"),
    }
    for key in ["sets", "modifiers"] {
        if root.contains_key(key) {
            parser.error(&[key.to_string()], format!("keyed `{key}` are not supported; list items in `resolutionOrder`"));
        }
    }

    let mut items_parser = ItemParser { doc, parser, seen: HashSet::new() };
    let keys = n_keys_between(None, None, items.len()).unwrap_or_default();
    for ((index, item), order) in items.iter().enumerate().zip(keys) {
        let pointer = vec!["resolutionOrder".to_string(), index.to_string()];
        items_parser.item(item, order, pointer);
    }

    let out = items_parser.parser.finish();
    debug!(name = %meta.name, nodes = out.nodes.len(), errors = out.errors.len(), "parsed resolver document");
    ResolverParseOutput { meta, nodes: out.nodes, errors: out.errors }
}

struct ItemParser<'d, 'p> {
    doc: &'d Value,
    parser: TreeParser<'p>,
    seen: HashSet<String>,
}

impl ItemParser<'_, '_> {
    fn error(&mut self, pointer: &[String], key: Option<&str>, message: impl Into<String>) {
        let mut at = pointer.to_vec();
        at.extend(key.map(str::to_string));
        self.parser.error(&at, message);
    }

    fn item(&mut self, item: &Value, order: String, pointer: Vec<String>) {
        let Some(obj) = item.as_object() else {
            self.error(&pointer, None, "item must be an object");
            return;
        };
        let Some(name) = obj.get("name").and_then(Value::as_str) else {
            self.error(&pointer, Some("name"), "item needs a string `name`");
            return;
        };
        let kind = obj.get("type").and_then(Value::as_str);
        if !matches!(kind, Some("set" | "modifier")) {
            self.error(&pointer, Some("type"), "item `type` must be \"set\" or \"modifier\"");
            return;
        }
        if !self.seen.insert(name.to_string()) {
            self.error(&pointer, Some("name"), format!("duplicate item name `{name}`"));
            return;
        }
        let description = self.string(obj, "description", &pointer);
        let extensions = self.extensions(obj, &pointer);
        if kind == Some("set") {
            let meta = SetMeta { name: name.to_string(), description, extensions };
            self.set(obj, meta, order, pointer);
        } else {
            let meta = ModifierMeta { name: name.to_string(), description, extensions, default_context: None };
            self.modifier(obj, meta, order, pointer);
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, key: &str, pointer: &[String]) -> Option<String> {
        match obj.get(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.error(pointer, Some(key), format!("`{key}` must be a string"));
                None
            }
        }
    }

    fn extensions(&mut self, obj: &Map<String, Value>, pointer: &[String]) -> Option<Map<String, Value>> {
        match obj.get("extensions")? {
            Value::Object(map) => Some(map.clone()),
            _ => {
                self.error(pointer, Some("extensions"), "`extensions` must be an object");
                None
            }
        }
    }

    fn set(&mut self, obj: &Map<String, Value>, meta: SetMeta, order: String, mut pointer: Vec<String>) {
        let Some(sources) = obj.get("sources").and_then(Value::as_array) else {
            self.error(&pointer, Some("sources"), "set needs a `sources` array");
            return;
        };
        let names = vec![meta.name.clone()];
        let id = self.parser.next_id(&names);
        self.parser.push(Node::new(id.clone(), None, order, Meta::Set(meta)));
        pointer.push("sources".into());
        self.sources(sources, &id, &names, &pointer);
    }

    fn modifier(&mut self, obj: &Map<String, Value>, mut meta: ModifierMeta, order: String, pointer: Vec<String>) {
        let Some(contexts) = obj.get("contexts").and_then(Value::as_object) else {
            self.error(&pointer, Some("contexts"), "modifier needs a `contexts` object");
            return;
        };
        if let Some(default) = self.string(obj, "default", &pointer) {
            if contexts.contains_key(&default) {
                meta.default_context = Some(default);
            } else {
                self.error(&pointer, Some("default"), format!("default context `{default}` is not defined"));
            }
        }
        let modifier_name = meta.name.clone();
        let id = self.parser.next_id(std::slice::from_ref(&modifier_name));
        self.parser.push(Node::new(id.clone(), None, order, Meta::Modifier(meta)));

        let keys = n_keys_between(None, None, contexts.len()).unwrap_or_default();
        for ((context, sources), order) in contexts.iter().zip(keys) {
            let mut at = pointer.clone();
            at.extend(["contexts".to_string(), context.clone()]);
            let Some(sources) = sources.as_array() else {
                self.error(&at, None, "context must list its sources");
                continue;
            };
            let names = vec![modifier_name.clone(), context.clone()];
            let context_id = self.parser.next_id(&names);
            let meta = Meta::ModifierContext(ContextMeta { name: context.clone() });
            self.parser.push(Node::new(context_id.clone(), Some(id.clone()), order, meta));
            self.sources(sources, &context_id, &names, &at);
        }
    }

    /// Merge `sources` and parse the result under `parent`.
    fn sources(&mut self, sources: &[Value], parent: &NodeId, names: &[String], pointer: &[String]) {
        let mut layers = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let mut at = pointer.to_vec();
            at.push(index.to_string());
            let Some(raw) = self.source(source, &at) else { continue };
            let raw = if self.parser.options().substitute_pointers {
                self.parser.substitute(&raw, &at)
            } else {
                raw
            };
            layers.push(raw);
        }
        if let Value::Object(root) = deep_merge_all(&layers, &is_token_object) {
            self.parser.document(&root, Some(parent), names, pointer);
        }
    }

    /// The document a source entry stands for. A `{"$ref": "#/..."}` entry
    /// points elsewhere in the resolver document.
    fn source(&mut self, source: &Value, pointer: &[String]) -> Option<Value> {
        let target = match as_local_ref(source) {
            None => source,
            Some(reference) if !reference.starts_with('#') => {
                self.error(pointer, None, format!("external source `{reference}` must be resolved by the caller"));
                return None;
            }
            Some(reference) => match find_by_fragment(self.doc, reference) {
                Ok(found) => found,
                Err(e) => {
                    self.error(pointer, None, format!("cannot resolve source `{reference}`: {e}"));
                    return None;
                }
            },
        };
        if !target.is_object() {
            self.error(pointer, None, "source must be an object");
            return None;
        }
        Some(target.clone())
    }
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Write Sets and Modifiers back as a resolver document.
///
/// Each Set or ModifierContext becomes a single source. Root `Resolver` nodes
/// are flattened into their children; when `meta` is `None` the first one
/// names the document.
pub fn serialize_resolver(store: &NodeStore, meta: Option<&ResolverMeta>) -> Result<Value, SerializeError> {
    serialize_resolver_with(store, meta, &SerializeOptions::default())
}

pub fn serialize_resolver_with(
    store: &NodeStore,
    meta: Option<&ResolverMeta>,
    options: &SerializeOptions,
) -> Result<Value, SerializeError> {
    let writer = TreeWriter::new(store, options);
    let mut meta = meta.cloned();
    let mut items = Vec::new();
    for root in store.get_children(None) {
        match &root.meta {
            Meta::Resolver(resolver) => {
                if meta.is_none() {
                    meta = Some(resolver.clone());
                }
                for child in store.get_children(Some(root.id.as_str())) {
                    items.push(write_item(store, &writer, child)?);
                }
            }
            _ => items.push(write_item(store, &writer, root)?),
        }
    }

    let mut doc = Map::new();
    doc.insert("version".into(), RESOLVER_VERSION.into());
    if let Some(meta) = meta {
        if !meta.name.is_empty() {
            doc.insert("name".into(), meta.name.into());
        }
        if let Some(d) = meta.description {
            doc.insert("description".into(), d.into());
        }
    }
    doc.insert("resolutionOrder".into(), Value::Array(items));
    Ok(Value::Object(doc))
}

fn write_item(store: &NodeStore, writer: &TreeWriter<'_>, node: &Node) -> Result<Value, SerializeError> {
    let mut item = Map::new();
    match &node.meta {
        Meta::Set(set) => {
            item.insert("type".into(), "set".into());
            item.insert("name".into(), set.name.as_str().into());
            write_described(&mut item, &set.description, &set.extensions);
            let source = writer.children(Some(node.id.as_str()), None)?;
            item.insert("sources".into(), Value::Array(vec![Value::Object(source)]));
        }
        Meta::Modifier(modifier) => {
            item.insert("type".into(), "modifier".into());
            item.insert("name".into(), modifier.name.as_str().into());
            write_described(&mut item, &modifier.description, &modifier.extensions);
            if let Some(default) = &modifier.default_context {
                item.insert("default".into(), default.as_str().into());
            }
            let mut contexts = Map::new();
            for context in store.get_children(Some(node.id.as_str())) {
                if !matches!(context.meta, Meta::ModifierContext(_)) {
                    return Err(SerializeError::StrayNode(context.id.to_string()));
                }
                let source = writer.children(Some(context.id.as_str()), None)?;
                contexts.insert(context.name().to_string(), Value::Array(vec![Value::Object(source)]));
            }
            item.insert("contexts".into(), Value::Object(contexts));
        }
        _ => return Err(SerializeError::StrayNode(node.id.to_string())),
    }
    Ok(Value::Object(item))
}

fn write_described(item: &mut Map<String, Value>, description: &Option<String>, extensions: &Option<Map<String, Value>>) {
    if let Some(d) = description {
        item.insert("description".into(), d.as_str().into());
    }
    if let Some(ext) = extensions {
        item.insert("extensions".into(), Value::Object(ext.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PathIds;
    use crate::resolve::ValueResolver;
    use serde_json::json;

    fn parse(doc: Value) -> ResolverParseOutput {
        parse_resolver(&doc, &mut PathIds)
    }

    fn number(n: u64) -> Value {
        json!({"$type": "number", "$value": n})
    }

    #[test]
    fn bad_version_short_circuits() {
        let out = parse(json!({"version": "2025.09", "resolutionOrder": [], "sets": {}}));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].path, "/version");
        assert!(out.nodes.is_empty());

        let out = parse(json!({"resolutionOrder": []}));
        assert_eq!(out.errors[0].message, "missing `version`");
    }

    #[test]
    fn non_array_order_short_circuits() {
        let out = parse(json!({"version": "2025.10", "resolutionOrder": {"base": {}}}));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].path, "/resolutionOrder");
    }

    #[test]
    fn keyed_sets_are_reported() {
        let out = parse(json!({"version": "2025.10", "sets": {"base": {}}, "resolutionOrder": []}));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].path, "/sets");
    }

    #[test]
    fn later_sources_win_at_token_level() {
        let out = parse(json!({
            "version": "2025.10",
            "name": "acme",
            "resolutionOrder": [{
                "type": "set",
                "name": "base",
                "sources": [
                    {"space": {"sm": number(4), "md": number(8)}},
                    {"space": {"md": number(12), "lg": number(16)}}
                ]
            }]
        }));
        assert!(out.is_clean(), "{:?}", out.errors);
        assert_eq!(out.meta.name, "acme");
        let store = NodeStore::from_nodes(out.nodes);
        let resolver = ValueResolver::new(&store);
        let names: Vec<&str> = store.get_children(Some("/base/space")).iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["sm", "md", "lg"]);
        let md = resolver.resolve_value("/base/space/md").unwrap();
        assert_eq!(md.value, crate::model::Literal::Number(12.into()));
    }

    #[test]
    fn item_errors_skip_the_item() {
        let out = parse(json!({
            "version": "2025.10",
            "resolutionOrder": [
                {"type": "set", "sources": []},
                {"type": "layer", "name": "x"},
                {"type": "set", "name": "a", "sources": []},
                {"type": "set", "name": "a", "sources": []},
                {"type": "modifier", "name": "m"},
                "nope"
            ]
        }));
        let paths: Vec<&str> = out.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/resolutionOrder/0/name",
                "/resolutionOrder/1/type",
                "/resolutionOrder/3/name",
                "/resolutionOrder/4/contexts",
                "/resolutionOrder/5",
            ]
        );
        assert_eq!(out.nodes.len(), 1);
    }

    #[test]
    fn modifier_contexts_keep_key_order() {
        let out = parse(json!({
            "version": "2025.10",
            "resolutionOrder": [{
                "type": "modifier",
                "name": "theme",
                "default": "light",
                "contexts": {"light": [{"bg": number(1)}], "dark": [{"bg": number(0)}]}
            }]
        }));
        assert!(out.is_clean(), "{:?}", out.errors);
        let store = NodeStore::from_nodes(out.nodes);
        let contexts: Vec<&str> = store.get_children(Some("/theme")).iter().map(|n| n.name()).collect();
        assert_eq!(contexts, vec!["light", "dark"]);
        match &store.get_node("/theme").unwrap().meta {
            Meta::Modifier(m) => assert_eq!(m.default_context.as_deref(), Some("light")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_default_context_is_reported() {
        let out = parse(json!({
            "version": "2025.10",
            "resolutionOrder": [{"type": "modifier", "name": "theme", "default": "dim", "contexts": {"light": []}}]
        }));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].path, "/resolutionOrder/0/default");
        assert_eq!(out.nodes.len(), 2);
    }

    #[test]
    fn local_source_refs_are_followed_and_external_ones_rejected() {
        let out = parse(json!({
            "version": "2025.10",
            "$defs": {"base": {"size": number(2)}},
            "resolutionOrder": [
                {"type": "set", "name": "core", "sources": [{"$ref": "#/$defs/base"}, {"$ref": "tokens/extra.json"}]}
            ]
        }));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].path, "/resolutionOrder/0/sources/1");
        assert!(out.errors[0].message.contains("must be resolved by the caller"));
        assert!(out.nodes.iter().any(|n| n.id.as_str() == "/core/size"));
    }

    #[test]
    fn serialize_rejects_stray_root_tokens() {
        let nodes = vec![Node::new(
            "t",
            None,
            "a0",
            Meta::Token(crate::model::TokenMeta::new("t", crate::model::Literal::Number(1.into()))),
        )];
        let err = serialize_resolver(&NodeStore::from_nodes(nodes), None).unwrap_err();
        assert_eq!(err, SerializeError::StrayNode("t".into()));
    }

    #[test]
    fn serialize_flattens_resolver_nodes() {
        let nodes = vec![
            Node::new("r", None, "a0", Meta::Resolver(ResolverMeta { name: "acme".into(), description: None })),
            Node::new("s", Some("r".into()), "a0", Meta::Set(SetMeta { name: "base".into(), ..SetMeta::default() })),
        ];
        let doc = serialize_resolver(&NodeStore::from_nodes(nodes), None).unwrap();
        assert_eq!(
            doc,
            json!({
                "version": "2025.10",
                "name": "acme",
                "resolutionOrder": [{"type": "set", "name": "base", "sources": [{}]}]
            })
        );
    }
}
