//! Staged batch of node writes.

use indexmap::IndexMap;

use crate::model::{Node, NodeId};

use super::NodeStore;

/// Mutation handle passed to [`NodeStore::transact`].
///
/// Writes are staged here and only reach the store when the closure returns
/// `Ok`. Reads through [`Transaction::get`] see staged writes.
pub struct Transaction<'a> {
    pub(super) store: &'a NodeStore,
    /// `None` marks a staged delete.
    pub(super) staged: IndexMap<NodeId, Option<Node>>,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(store: &'a NodeStore) -> Self {
        Self { store, staged: IndexMap::new() }
    }

    /// Insert `node`, or replace the node with the same id.
    pub fn set(&mut self, node: Node) {
        self.staged.insert(node.id.clone(), Some(node));
    }

    /// Remove a node. Its descendants are left in place.
    pub fn delete(&mut self, id: &str) {
        self.staged.insert(NodeId::from(id), None);
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.set(node);
        }
    }

    /// Look up a node as it will be after this batch commits.
    pub fn get(&self, id: &str) -> Option<&Node> {
        match self.staged.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.store.get_node(id),
        }
    }

    /// The committed store this batch is based on.
    pub fn base(&self) -> &NodeStore {
        self.store
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
