use std::collections::BTreeMap;

use token_graph::{Meta, Node, NodeStore, ResolveError, ResolvedToken, ValueResolver};

/// What survives a round trip: every node by name path, with its kind and,
/// for tokens, the resolution result.
pub type Snapshot = BTreeMap<String, (&'static str, Option<Result<ResolvedToken, ResolveError>>)>;

pub fn snapshot(nodes: Vec<Node>) -> Snapshot {
    let store = NodeStore::from_nodes(nodes);
    let resolver = ValueResolver::new(&store);
    store
        .all_nodes()
        .values()
        .map(|node| {
            let mut names: Vec<&str> = store.ancestors(&node.id).map(Node::name).collect();
            names.reverse();
            names.push(node.name());
            let kind = match node.meta {
                Meta::Token(_) => "token",
                Meta::Group(_) => "group",
                Meta::Set(_) => "set",
                Meta::Modifier(_) => "modifier",
                Meta::ModifierContext(_) => "context",
                Meta::Resolver(_) => "resolver",
            };
            let resolved = node.is_token().then(|| resolver.resolve_value(&node.id));
            (names.join("/"), (kind, resolved))
        })
        .collect()
}
