//! Single-tree token documents.
//!
//! ```json
//! {
//!   "colors": {
//!     "$type": "color",
//!     "primary": { "$value": { "colorSpace": "srgb", "components": [0, 0, 1] } }
//!   },
//!   "brand": { "$type": "color", "$value": "{colors.primary}" }
//! }
//! ```
//!
//! An object with `$value` is a token, any other object is a group. An object
//! holding both `$value` and child keys is a group whose own value lives in a
//! `$root` child token; the explicit `"$root": {...}` child spelling means the
//! same thing and is what [`serialize`] writes.

use std::collections::HashMap;

use serde_json::{Map, Value};
use token_graph_json_pointer::format_json_pointer;
use tracing::{debug, warn};

use super::pointer::substitute_pointers;
use super::value::{parse_value, write_value};
use super::{
    IdGenerator, ParseError, ParseOptions, ParseOutput, SerializeError, SerializeOptions,
    KEY_DEPRECATED, KEY_DESCRIPTION, KEY_EXTENSIONS, KEY_SCHEMA, KEY_TYPE, KEY_VALUE, META_PREFIX,
};
use crate::model::{
    AliasRef, Deprecated, GroupMeta, Meta, Node, NodeId, TokenMeta, TokenType, ROOT_TOKEN_NAME,
};
use crate::order::n_keys_between;
use crate::resolve::ValueResolver;
use crate::store::NodeStore;

/// Parse a document with default options.
pub fn parse(doc: &Value, ids: &mut dyn IdGenerator) -> ParseOutput {
    parse_with(doc, ids, &ParseOptions::default())
}

pub fn parse_with(doc: &Value, ids: &mut dyn IdGenerator, options: &ParseOptions) -> ParseOutput {
    let mut parser = TreeParser::new(ids, options);
    let Some(root) = doc.as_object() else {
        parser.error(&[], "document root must be an object");
        return parser.finish();
    };
    let substituted;
    let root = if options.substitute_pointers {
        substituted = parser.substitute(doc, &[]);
        substituted.as_object().unwrap_or(root)
    } else {
        root
    };
    parser.document(root, None, &[], &[]);
    parser.finish()
}

/// Write the whole store as one document.
pub fn serialize(store: &NodeStore) -> Result<Value, SerializeError> {
    serialize_with(store, &SerializeOptions::default())
}

pub fn serialize_with(store: &NodeStore, options: &SerializeOptions) -> Result<Value, SerializeError> {
    TreeWriter::new(store, options).children(None, None).map(Value::Object)
}

// ── Names ─────────────────────────────────────────────────────────────────

/// Checks a group or token name.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if name.starts_with(META_PREFIX) {
        return Err(format!("name `{name}` must not start with `$`"));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '{' | '}' | '.')) {
        return Err(format!("name `{name}` must not contain `{c}`"));
    }
    Ok(())
}

// ── Parser ────────────────────────────────────────────────────────────────

/// Metadata shared by groups and tokens.
#[derive(Default)]
struct Common {
    declared_type: Option<TokenType>,
    description: Option<String>,
    deprecated: Option<Deprecated>,
    extensions: Option<Map<String, Value>>,
}

/// Where a group's own token comes from.
#[derive(Clone, Copy)]
enum SelfToken<'v> {
    /// Document roots carry none; a `$root` key there is not a child.
    Absent,
    /// An explicit `$root` child entry, if present.
    Child,
    /// A coincident `$value`, stored as the first child.
    Inline(&'v Value),
}

/// Builds nodes from raw objects; also drives the resolver codec.
pub(crate) struct TreeParser<'a> {
    ids: &'a mut dyn IdGenerator,
    options: &'a ParseOptions,
    out: ParseOutput,
    /// JSON Pointer of every token, for reference errors.
    pointers: HashMap<NodeId, String>,
}

impl<'a> TreeParser<'a> {
    pub(crate) fn new(ids: &'a mut dyn IdGenerator, options: &'a ParseOptions) -> Self {
        Self { ids, options, out: ParseOutput::default(), pointers: HashMap::new() }
    }

    pub(crate) fn error(&mut self, pointer: &[String], message: impl Into<String>) {
        let error = ParseError::new(pointer, message);
        debug!(path = %error.path, message = %error.message, "parse error");
        self.out.errors.push(error);
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        self.options
    }

    pub(crate) fn next_id(&mut self, names: &[String]) -> NodeId {
        self.ids.next_id(names)
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.out.nodes.push(node);
    }

    pub(crate) fn substitute(&mut self, doc: &Value, base: &[String]) -> Value {
        substitute_pointers(doc, base, &mut self.out.errors)
    }

    /// Parse the children of a document root into `parent`.
    ///
    /// `names` prefixes node ids, `pointer` prefixes error paths.
    pub(crate) fn document(
        &mut self,
        root: &Map<String, Value>,
        parent: Option<&NodeId>,
        names: &[String],
        pointer: &[String],
    ) {
        for key in root.keys().filter(|k| k.starts_with(META_PREFIX)) {
            if key == KEY_SCHEMA {
                continue;
            }
            let mut at = pointer.to_vec();
            at.push(key.clone());
            self.error(&at, format!("unexpected key `{key}` at document root"));
        }
        let mut names = names.to_vec();
        let mut pointer = pointer.to_vec();
        self.children(root, parent, None, SelfToken::Absent, &mut names, &mut pointer);
    }

    /// Parse the child entries of `obj`, starting with its own token.
    fn children(
        &mut self,
        obj: &Map<String, Value>,
        parent: Option<&NodeId>,
        inherited: Option<TokenType>,
        own: SelfToken<'_>,
        names: &mut Vec<String>,
        pointer: &mut Vec<String>,
    ) {
        let (roots, rest): (Vec<_>, Vec<_>) = obj
            .iter()
            .filter(|(k, _)| {
                !k.starts_with(META_PREFIX) || (k.as_str() == ROOT_TOKEN_NAME && matches!(own, SelfToken::Child))
            })
            .partition(|(k, _)| k.as_str() == ROOT_TOKEN_NAME);
        let count = roots.len() + rest.len() + usize::from(matches!(own, SelfToken::Inline(_)));
        let mut keys = n_keys_between(None, None, count).unwrap_or_default().into_iter();

        if let SelfToken::Inline(raw) = own {
            if let Some(order) = keys.next() {
                names.push(ROOT_TOKEN_NAME.to_string());
                self.token(ROOT_TOKEN_NAME, raw, Common::default(), parent, inherited, order, names, pointer);
                names.pop();
            }
        }
        for ((name, raw), order) in roots.into_iter().chain(rest).zip(keys) {
            names.push(name.clone());
            pointer.push(name.clone());
            self.node(name, raw, parent, inherited, order, names, pointer);
            names.pop();
            pointer.pop();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn node(
        &mut self,
        name: &str,
        raw: &Value,
        parent: Option<&NodeId>,
        inherited: Option<TokenType>,
        order: String,
        names: &mut Vec<String>,
        pointer: &mut Vec<String>,
    ) {
        let is_root = name == ROOT_TOKEN_NAME;
        if !is_root {
            if let Err(message) = validate_name(name) {
                self.error(pointer, message);
                return;
            }
        }
        let Some(obj) = raw.as_object() else {
            self.error(pointer, "expected an object");
            return;
        };
        let Some(common) = self.common(obj, pointer) else {
            return;
        };
        let has_children = obj.keys().any(|k| !k.starts_with(META_PREFIX) || k == ROOT_TOKEN_NAME);
        let own_value = obj.get(KEY_VALUE);

        if is_root {
            match own_value {
                Some(_) if has_children => self.error(pointer, "`$root` cannot have children"),
                Some(raw_value) => self.token(name, raw_value, common, parent, inherited, order, names, pointer),
                None => self.error(pointer, "`$root` must hold a `$value`"),
            }
            return;
        }
        if let (Some(raw_value), false) = (own_value, has_children) {
            self.token(name, raw_value, common, parent, inherited, order, names, pointer);
            return;
        }

        let own = match own_value {
            Some(_) if obj.contains_key(ROOT_TOKEN_NAME) => {
                pointer.push(KEY_VALUE.to_string());
                self.error(pointer, "both `$value` and `$root` given; `$value` ignored");
                pointer.pop();
                SelfToken::Child
            }
            Some(raw_value) => SelfToken::Inline(raw_value),
            None => SelfToken::Child,
        };
        let id = self.next_id(names);
        let inherited = common.declared_type.or(inherited);
        let meta = GroupMeta {
            name: name.to_string(),
            description: common.description,
            deprecated: common.deprecated,
            extensions: common.extensions,
            declared_type: common.declared_type,
        };
        self.push(Node::new(id.clone(), parent.cloned(), order, Meta::Group(meta)));
        self.children(obj, Some(&id), inherited, own, names, pointer);
    }

    #[allow(clippy::too_many_arguments)]
    fn token(
        &mut self,
        name: &str,
        raw_value: &Value,
        common: Common,
        parent: Option<&NodeId>,
        inherited: Option<TokenType>,
        order: String,
        names: &[String],
        pointer: &mut Vec<String>,
    ) {
        let ty = common.declared_type.or(inherited);
        pointer.push(KEY_VALUE.to_string());
        let value = match parse_value(raw_value, ty) {
            Ok(value) => value,
            Err(message) => {
                self.error(pointer, message);
                pointer.pop();
                return;
            }
        };
        pointer.pop();
        let id = self.next_id(names);
        let meta = TokenMeta {
            name: name.to_string(),
            description: common.description,
            deprecated: common.deprecated,
            extensions: common.extensions,
            declared_type: common.declared_type,
            value,
        };
        self.pointers.insert(id.clone(), format_json_pointer(pointer.as_slice()));
        self.push(Node::new(id, parent.cloned(), order, Meta::Token(meta)));
    }

    /// Reads the reserved keys of a node. `None` drops the node.
    fn common(&mut self, obj: &Map<String, Value>, pointer: &mut Vec<String>) -> Option<Common> {
        let mut common = Common::default();
        for (key, raw) in obj.iter().filter(|(k, _)| k.starts_with(META_PREFIX)) {
            pointer.push(key.clone());
            match key.as_str() {
                KEY_TYPE => match raw.as_str().map(str::parse::<TokenType>) {
                    Some(Ok(t)) => common.declared_type = Some(t),
                    Some(Err(e)) => {
                        self.error(pointer, e.to_string());
                        pointer.pop();
                        return None;
                    }
                    None => {
                        self.error(pointer, "`$type` must be a string");
                        pointer.pop();
                        return None;
                    }
                },
                KEY_DESCRIPTION => match raw {
                    Value::String(s) => common.description = Some(s.clone()),
                    _ => self.error(pointer, "`$description` must be a string"),
                },
                KEY_DEPRECATED => match raw {
                    Value::Bool(b) => common.deprecated = Some(Deprecated::Flag(*b)),
                    Value::String(s) => common.deprecated = Some(Deprecated::Reason(s.clone())),
                    _ => self.error(pointer, "`$deprecated` must be a boolean or a string"),
                },
                KEY_EXTENSIONS => match raw {
                    Value::Object(map) => common.extensions = Some(map.clone()),
                    _ => self.error(pointer, "`$extensions` must be an object"),
                },
                KEY_VALUE => {}
                k if k == ROOT_TOKEN_NAME => {}
                other => self.error(pointer, format!("unknown key `{other}` ignored")),
            }
            pointer.pop();
        }
        Some(common)
    }

    /// Check every alias against the parsed nodes, then hand back the output.
    pub(crate) fn finish(mut self) -> ParseOutput {
        if self.options.validate_references {
            let store = NodeStore::from_nodes(self.out.nodes.iter().cloned());
            let resolver = ValueResolver::new(&store);
            for node in store.tokens() {
                let Some(token) = node.as_token() else { continue };
                if token.value.aliases().is_empty() {
                    continue;
                }
                if let Err(e) = resolver.resolve_value(&node.id) {
                    let base = self.pointers.get(&node.id).cloned().unwrap_or_default();
                    let error = ParseError { path: format!("{base}/{KEY_VALUE}"), message: e.to_string() };
                    debug!(path = %error.path, message = %error.message, "reference error");
                    self.out.errors.push(error);
                }
            }
        }
        if !self.out.errors.is_empty() {
            warn!(errors = self.out.errors.len(), nodes = self.out.nodes.len(), "document parsed with errors");
        }
        self.out
    }
}

// ── Writer ────────────────────────────────────────────────────────────────

/// Turns groups and tokens under a parent back into document objects.
pub(crate) struct TreeWriter<'s> {
    store: &'s NodeStore,
    resolver: ValueResolver<'s>,
    options: &'s SerializeOptions,
}

impl<'s> TreeWriter<'s> {
    pub(crate) fn new(store: &'s NodeStore, options: &'s SerializeOptions) -> Self {
        Self { store, resolver: ValueResolver::new(store), options }
    }

    /// Object holding the groups and tokens under `parent`, in sibling order.
    pub(crate) fn children(
        &self,
        parent: Option<&str>,
        inherited: Option<TokenType>,
    ) -> Result<Map<String, Value>, SerializeError> {
        let mut out = Map::new();
        for child in self.store.get_children(parent) {
            let value = match &child.meta {
                Meta::Group(group) => self.group(child, group, inherited)?,
                Meta::Token(token) => self.token(child, token, inherited)?,
                _ => {
                    warn!(id = %child.id, "skipping container node inside a token tree");
                    continue;
                }
            };
            if out.contains_key(child.name()) {
                warn!(id = %child.id, name = child.name(), "duplicate sibling name; later node dropped");
                continue;
            }
            out.insert(child.name().to_string(), value);
        }
        Ok(out)
    }

    fn type_key(&self, declared: Option<TokenType>, inherited: Option<TokenType>) -> Option<TokenType> {
        let declared = declared?;
        if self.options.minimal_types && Some(declared) == inherited {
            None
        } else {
            Some(declared)
        }
    }

    fn group(&self, node: &Node, group: &GroupMeta, inherited: Option<TokenType>) -> Result<Value, SerializeError> {
        let mut map = Map::new();
        if let Some(t) = self.type_key(group.declared_type, inherited) {
            map.insert(KEY_TYPE.into(), t.as_str().into());
        }
        write_common(&mut map, &group.description, &group.deprecated, &group.extensions);
        let children = self.children(Some(node.id.as_str()), group.declared_type.or(inherited))?;
        map.extend(children);
        Ok(Value::Object(map))
    }

    fn token(&self, node: &Node, token: &TokenMeta, inherited: Option<TokenType>) -> Result<Value, SerializeError> {
        let mut map = Map::new();
        let ty = self.type_key(token.declared_type, inherited).or_else(|| {
            // A literal with nothing to inherit needs its kind spelled out.
            match (token.declared_type, inherited, token.value.as_literal()) {
                (None, None, Some(lit)) => Some(lit.token_type()),
                _ => None,
            }
        });
        if let Some(t) = ty {
            map.insert(KEY_TYPE.into(), t.as_str().into());
        }
        let mut alias = |a: &AliasRef| self.alias(node, a);
        map.insert(KEY_VALUE.into(), write_value(&token.value, &mut alias)?);
        write_common(&mut map, &token.description, &token.deprecated, &token.extensions);
        Ok(Value::Object(map))
    }

    fn alias(&self, node: &Node, alias: &AliasRef) -> Result<String, SerializeError> {
        match alias {
            AliasRef::Path(path) => Ok(format!("{{{path}}}")),
            AliasRef::Id(id) => self
                .resolver
                .token_path(id)
                .map(|path| format!("{{{path}}}"))
                .ok_or_else(|| SerializeError::DanglingReference {
                    token: node.id.to_string(),
                    alias: alias.to_string(),
                }),
        }
    }
}

fn write_common(
    map: &mut Map<String, Value>,
    description: &Option<String>,
    deprecated: &Option<Deprecated>,
    extensions: &Option<Map<String, Value>>,
) {
    if let Some(d) = description {
        map.insert(KEY_DESCRIPTION.into(), d.as_str().into());
    }
    match deprecated {
        Some(Deprecated::Flag(b)) => {
            map.insert(KEY_DEPRECATED.into(), Value::Bool(*b));
        }
        Some(Deprecated::Reason(r)) => {
            map.insert(KEY_DEPRECATED.into(), r.as_str().into());
        }
        None => {}
    }
    if let Some(ext) = extensions {
        map.insert(KEY_EXTENSIONS.into(), Value::Object(ext.clone()));
    }
}
