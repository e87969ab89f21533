//! Hierarchical node store.
//!
//! Nodes live in a flat id-keyed map; children are an index over `parent_id`
//! kept sorted by `(order, insertion sequence)`. All writes go through
//! [`NodeStore::transact`], which applies a staged batch in one step.

mod transaction;

pub use transaction::Transaction;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::model::{Node, NodeId};
use crate::order::{key_between, OrderKeyError};

/// In-memory node store.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: IndexMap<NodeId, Node>,
    /// Insertion sequence, kept across replacements; breaks `order` ties.
    seqs: HashMap<NodeId, u64>,
    roots: Vec<NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    next_seq: u64,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `nodes`, committed as one batch.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut store = Self::new();
        let mut tx = Transaction::new(&store);
        tx.extend(nodes);
        let staged = tx.staged;
        store.commit(staged);
        store
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Every node keyed by id, in first-insertion order.
    pub fn all_nodes(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `parent` (`None` = roots), sorted by order key.
    pub fn get_children(&self, parent: Option<&str>) -> Vec<&Node> {
        self.child_ids(parent)
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    pub fn get_parent(&self, id: &str) -> Option<&Node> {
        let parent_id = self.nodes.get(id)?.parent_id.as_ref()?;
        self.nodes.get(parent_id)
    }

    pub fn get_prev_sibling(&self, id: &str) -> Option<&Node> {
        let (siblings, pos) = self.sibling_position(id)?;
        let prev = siblings.get(pos.checked_sub(1)?)?;
        self.nodes.get(prev)
    }

    pub fn get_next_sibling(&self, id: &str) -> Option<&Node> {
        let (siblings, pos) = self.sibling_position(id)?;
        self.nodes.get(siblings.get(pos + 1)?)
    }

    /// Walk from the parent of `id` up to its root.
    pub fn ancestors<'s>(&'s self, id: &str) -> impl Iterator<Item = &'s Node> + 's {
        let start = self.get_parent(id);
        // Bounded so a malformed parent cycle cannot loop forever.
        std::iter::successors(start, move |node| {
            node.parent_id.as_deref().and_then(|p| self.nodes.get(p))
        })
        .take(self.nodes.len())
    }

    /// All token nodes, in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.is_token())
    }

    /// A key sorting after every current child of `parent`.
    pub fn key_after_last_child(&self, parent: Option<&str>) -> Result<String, OrderKeyError> {
        let last = self.child_ids(parent).last().and_then(|id| self.nodes.get(id));
        key_between(last.map(|n| n.order.as_str()), None)
    }

    /// A key sorting before every current child of `parent`.
    pub fn key_before_first_child(&self, parent: Option<&str>) -> Result<String, OrderKeyError> {
        let first = self.child_ids(parent).first().and_then(|id| self.nodes.get(id));
        key_between(None, first.map(|n| n.order.as_str()))
    }

    fn child_ids(&self, parent: Option<&str>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(p) => self.children.get(p).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    fn sibling_position(&self, id: &str) -> Option<(&[NodeId], usize)> {
        let node = self.nodes.get(id)?;
        let siblings = self.child_ids(node.parent_id.as_deref());
        let pos = siblings.iter().position(|s| s.as_str() == id)?;
        Some((siblings, pos))
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Run `f` against a fresh [`Transaction`] and apply its writes.
    ///
    /// If `f` returns `Err` nothing is applied. Readers can never see part of
    /// a batch since the store is borrowed mutably for the whole call.
    pub fn transact<R, E>(
        &mut self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut tx = Transaction::new(self);
        let out = match f(&mut tx) {
            Ok(out) => out,
            Err(e) => {
                debug!(staged = tx.len(), "transaction aborted, batch discarded");
                return Err(e);
            }
        };
        let staged = tx.staged;
        self.commit(staged);
        Ok(out)
    }

    fn commit(&mut self, staged: IndexMap<NodeId, Option<Node>>) {
        let mut touched: HashSet<Option<NodeId>> = HashSet::new();
        let (mut sets, mut deletes) = (0usize, 0usize);

        for (id, change) in staged {
            if let Some(old) = self.nodes.get(&id) {
                let old_parent = old.parent_id.clone();
                self.detach(&id, old_parent.as_ref());
                touched.insert(old_parent);
            }
            match change {
                Some(node) => {
                    sets += 1;
                    if !self.seqs.contains_key(&id) {
                        self.seqs.insert(id.clone(), self.next_seq);
                        self.next_seq += 1;
                    }
                    match &node.parent_id {
                        None => self.roots.push(id.clone()),
                        Some(p) => self.children.entry(p.clone()).or_default().push(id.clone()),
                    }
                    touched.insert(node.parent_id.clone());
                    self.nodes.insert(id, node);
                }
                None => {
                    if self.nodes.shift_remove(&id).is_some() {
                        deletes += 1;
                    }
                    self.seqs.remove(&id);
                }
            }
        }

        for parent in touched {
            self.sort_children(parent.as_ref());
        }
        debug!(sets, deletes, total = self.nodes.len(), "committed batch");
    }

    fn detach(&mut self, id: &NodeId, parent: Option<&NodeId>) {
        match parent {
            None => self.roots.retain(|r| r != id),
            Some(p) => {
                if let Some(list) = self.children.get_mut(p) {
                    list.retain(|c| c != id);
                    if list.is_empty() {
                        self.children.remove(p);
                    }
                }
            }
        }
    }

    fn sort_children(&mut self, parent: Option<&NodeId>) {
        let Self { nodes, seqs, roots, children, .. } = self;
        let list = match parent {
            None => roots,
            Some(p) => match children.get_mut(p) {
                Some(list) => list,
                None => return,
            },
        };
        list.sort_by(|a, b| {
            let (na, nb) = (&nodes[a], &nodes[b]);
            na.order
                .cmp(&nb.order)
                .then_with(|| seqs.get(a).cmp(&seqs.get(b)))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupMeta, Meta};
    use std::convert::Infallible;

    fn group(id: &str, parent: Option<&str>, order: &str) -> Node {
        Node::new(id, parent.map(NodeId::from), order, Meta::Group(GroupMeta::new(id)))
    }

    fn names(nodes: Vec<&Node>) -> Vec<String> {
        nodes.into_iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn children_sorted_by_order_key() {
        let store = NodeStore::from_nodes([
            group("root", None, "a0"),
            group("c", Some("root"), "a2"),
            group("a", Some("root"), "a0"),
            group("b", Some("root"), "a1"),
        ]);
        assert_eq!(names(store.get_children(Some("root"))), vec!["a", "b", "c"]);
        assert_eq!(names(store.get_children(None)), vec!["root"]);
    }

    #[test]
    fn equal_keys_fall_back_to_insertion_order() {
        let store = NodeStore::from_nodes([
            group("second", None, "a0"),
            group("first", None, "a0"),
        ]);
        assert_eq!(names(store.get_children(None)), vec!["second", "first"]);
    }

    #[test]
    fn siblings_and_parent() {
        let store = NodeStore::from_nodes([
            group("p", None, "a0"),
            group("x", Some("p"), "a0"),
            group("y", Some("p"), "a1"),
        ]);
        assert_eq!(store.get_parent("x").unwrap().id.as_str(), "p");
        assert!(store.get_parent("p").is_none());
        assert_eq!(store.get_next_sibling("x").unwrap().id.as_str(), "y");
        assert!(store.get_next_sibling("y").is_none());
        assert_eq!(store.get_prev_sibling("y").unwrap().id.as_str(), "x");
        assert!(store.get_prev_sibling("x").is_none());
    }

    #[test]
    fn replace_moves_between_parents() {
        let mut store = NodeStore::from_nodes([
            group("p1", None, "a0"),
            group("p2", None, "a1"),
            group("x", Some("p1"), "a0"),
        ]);
        store
            .transact(|tx| {
                tx.set(group("x", Some("p2"), "a0"));
                Ok::<_, Infallible>(())
            })
            .unwrap();
        assert!(store.get_children(Some("p1")).is_empty());
        assert_eq!(names(store.get_children(Some("p2"))), vec!["x"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn failed_transaction_applies_nothing() {
        let mut store = NodeStore::from_nodes([group("keep", None, "a0")]);
        let result: Result<(), &str> = store.transact(|tx| {
            tx.set(group("new", None, "a1"));
            tx.delete("keep");
            Err("host failure")
        });
        assert_eq!(result, Err("host failure"));
        assert!(store.contains("keep"));
        assert!(!store.contains("new"));
    }

    #[test]
    fn delete_orphans_descendants() {
        let mut store = NodeStore::from_nodes([
            group("p", None, "a0"),
            group("c", Some("p"), "a0"),
        ]);
        store
            .transact(|tx| {
                tx.delete("p");
                Ok::<_, Infallible>(())
            })
            .unwrap();
        assert!(!store.contains("p"));
        let orphan = store.get_node("c").unwrap();
        assert_eq!(orphan.parent_id.as_ref().map(NodeId::as_str), Some("p"));
        assert!(store.get_parent("c").is_none());
        assert!(store.get_children(None).is_empty());
    }

    #[test]
    fn transaction_reads_see_staged_writes() {
        let mut store = NodeStore::from_nodes([group("a", None, "a0")]);
        store
            .transact(|tx| {
                tx.set(group("b", None, "a1"));
                tx.delete("a");
                assert!(tx.get("b").is_some());
                assert!(tx.get("a").is_none());
                assert!(tx.base().contains("a"));
                Ok::<_, Infallible>(())
            })
            .unwrap();
        assert_eq!(names(store.get_children(None)), vec!["b"]);
    }

    #[test]
    fn append_and_prepend_keys() {
        let mut store = NodeStore::new();
        for id in ["m", "n"] {
            let key = store.key_after_last_child(None).unwrap();
            store
                .transact(|tx| {
                    tx.set(group(id, None, &key));
                    Ok::<_, Infallible>(())
                })
                .unwrap();
        }
        let key = store.key_before_first_child(None).unwrap();
        store
            .transact(|tx| {
                tx.set(group("l", None, &key));
                Ok::<_, Infallible>(())
            })
            .unwrap();
        assert_eq!(names(store.get_children(None)), vec!["l", "m", "n"]);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let store = NodeStore::from_nodes([
            group("a", None, "a0"),
            group("b", Some("a"), "a0"),
            group("c", Some("b"), "a0"),
        ]);
        let chain: Vec<&str> = store.ancestors("c").map(|n| n.id.as_str()).collect();
        assert_eq!(chain, vec!["b", "a"]);
    }
}
