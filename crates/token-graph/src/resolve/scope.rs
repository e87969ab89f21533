//! Alias path lookup.
//!
//! A dotted path is looked up in a stack of namespace layers. Each layer is
//! the child list of one container: root-level groups and tokens first, then
//! every Set in root order, then one context per Modifier. Containers never
//! consume a path segment. The last layer that defines the path wins, so
//! later sets and modifier contexts override earlier ones.
//!
//! Within a layer, every segment but the last must name a Group; the last
//! names a Token, or a Group whose `$root` token is taken instead.

use std::collections::HashMap;

use crate::model::{Meta, Node, NodeId, ROOT_TOKEN_NAME};
use crate::store::NodeStore;

pub(crate) struct Scope<'s> {
    store: &'s NodeStore,
    /// Parent ids whose children form a namespace layer; `None` is the root.
    layers: Vec<Option<&'s str>>,
}

impl<'s> Scope<'s> {
    /// Layers visible from `from`; a token inside a modifier context sees that
    /// context instead of the modifier's default.
    pub(crate) fn new(store: &'s NodeStore, from: Option<&str>) -> Self {
        let mut active: HashMap<&'s str, &'s str> = HashMap::new();
        if let Some(from) = from {
            let start = store.get_node(from);
            for node in start.into_iter().chain(store.ancestors(from)) {
                if let (Meta::ModifierContext(_), Some(modifier)) = (&node.meta, &node.parent_id) {
                    active.insert(modifier.as_str(), node.id.as_str());
                }
            }
        }
        let mut scope = Scope { store, layers: vec![None] };
        for root in store.get_children(None) {
            scope.push_container(root, &active);
        }
        scope
    }

    fn push_container(&mut self, node: &'s Node, active: &HashMap<&'s str, &'s str>) {
        match &node.meta {
            Meta::Set(_) | Meta::ModifierContext(_) => self.layers.push(Some(node.id.as_str())),
            Meta::Resolver(_) => {
                let store = self.store;
                for child in store.get_children(Some(node.id.as_str())) {
                    self.push_container(child, active);
                }
            }
            Meta::Modifier(modifier) => {
                let contexts: Vec<&'s Node> = self
                    .store
                    .get_children(Some(node.id.as_str()))
                    .into_iter()
                    .filter(|c| matches!(c.meta, Meta::ModifierContext(_)))
                    .collect();
                let chosen = active
                    .get(node.id.as_str())
                    .and_then(|id| contexts.iter().find(|c| c.id.as_str() == *id))
                    .or_else(|| {
                        let default = modifier.default_context.as_deref()?;
                        contexts.iter().find(|c| c.name() == default)
                    })
                    .or_else(|| contexts.first());
                if let Some(context) = chosen {
                    self.layers.push(Some(context.id.as_str()));
                }
            }
            Meta::Group(_) | Meta::Token(_) => {}
        }
    }

    /// Find the token named by `segments`, searching later layers first.
    pub(crate) fn lookup(&self, segments: &[&str]) -> Option<&'s Node> {
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        self.layers
            .iter()
            .rev()
            .find_map(|layer| self.lookup_in(*layer, segments))
    }

    fn lookup_in(&self, layer: Option<&str>, segments: &[&str]) -> Option<&'s Node> {
        let (last, parents) = segments.split_last()?;
        let mut parent: Option<&'s NodeId> = None;
        for segment in parents {
            let scope = parent.map(|p| p.as_str()).or(layer);
            let group = self
                .store
                .get_children(scope)
                .into_iter()
                .find(|n| n.is_group() && n.name() == *segment)?;
            parent = Some(&group.id);
        }
        let scope = parent.map(|p| p.as_str()).or(layer);
        let children = self.store.get_children(scope);
        if let Some(token) = children.iter().copied().find(|n| n.is_token() && n.name() == *last) {
            return Some(token);
        }
        let group = children.iter().copied().find(|n| n.is_group() && n.name() == *last)?;
        root_token(self.store, &group.id)
    }
}

/// The `$root` token of a group, if it has one.
pub(crate) fn root_token<'s>(store: &'s NodeStore, group: &str) -> Option<&'s Node> {
    store
        .get_children(Some(group))
        .into_iter()
        .find(|n| n.is_token() && n.name() == ROOT_TOKEN_NAME)
}
