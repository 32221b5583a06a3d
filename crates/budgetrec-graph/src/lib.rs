#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Bipartite graph views for plotting and inspection.
//!
//! Views are snapshots derived on demand from an [`InteractionStore`] or from
//! the output of [`Recommender::recommend_all`](budgetrec_core::Recommender::recommend_all).
//! They borrow nothing and never write back, so a renderer can hold them as
//! long as it likes.

use budgetrec_core::{InteractionStore, ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Which side of the bipartite graph a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Item,
}

/// A node with its bipartite layout position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Display label, `u<n>` or `i<n>`.
    pub id: String,
    pub kind: NodeKind,
    pub raw: u64,
    /// `[x, y]`: users at x = 0, items at x = 1, y evenly spread over `[0, 1]`.
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub user: UserId,
    pub item: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BipartiteGraph {
    pub title: String,
    pub generated_at: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl BipartiteGraph {
    fn build(
        title: &str,
        users: &BTreeSet<UserId>,
        items: &BTreeSet<ItemId>,
        edges: BTreeSet<Edge>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(users.len() + items.len());
        for (n, user) in users.iter().enumerate() {
            nodes.push(Node {
                id: user.to_string(),
                kind: NodeKind::User,
                raw: user.raw(),
                position: [0.0, spread(n, users.len())],
            });
        }
        for (n, item) in items.iter().enumerate() {
            nodes.push(Node {
                id: item.to_string(),
                kind: NodeKind::Item,
                raw: item.raw(),
                position: [1.0, spread(n, items.len())],
            });
        }
        Self {
            title: title.to_string(),
            generated_at: iso8601_now(),
            nodes,
            edges: edges.into_iter().collect(),
        }
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Graphviz DOT; users and items each share a rank.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "graph budgetrec {{");
        let _ = writeln!(out, "  label=\"{}\";", self.title.replace('"', "\\\""));
        let _ = writeln!(out, "  rankdir=LR;");
        for (kind, shape) in [(NodeKind::User, "ellipse"), (NodeKind::Item, "box")] {
            let _ = writeln!(out, "  {{ rank=same;");
            for node in self.nodes_of(kind) {
                let _ = writeln!(out, "    \"{}\" [shape={shape}];", node.id);
            }
            let _ = writeln!(out, "  }}");
        }
        for edge in &self.edges {
            let _ = writeln!(out, "  \"{}\" -- \"{}\";", edge.user, edge.item);
        }
        out.push_str("}\n");
        out
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Every known user and item, one edge per distinct interacting pair.
#[must_use]
pub fn interaction_graph(store: &InteractionStore) -> BipartiteGraph {
    let edges: BTreeSet<Edge> = store
        .interactions()
        .map(|(user, item)| Edge { user, item })
        .collect();
    BipartiteGraph::build(
        "User and Items Interaction Graph",
        &store.all_known_users(),
        store.all_known_items(),
        edges,
    )
}

/// Users and the items recommended to them.
#[must_use]
pub fn recommendation_graph(recommendations: &BTreeMap<UserId, Vec<ItemId>>) -> BipartiteGraph {
    let users: BTreeSet<UserId> = recommendations.keys().copied().collect();
    let items: BTreeSet<ItemId> = recommendations.values().flatten().copied().collect();
    let edges: BTreeSet<Edge> = recommendations
        .iter()
        .flat_map(|(user, items)| items.iter().map(move |item| Edge { user: *user, item: *item }))
        .collect();
    BipartiteGraph::build("User and Recommended Items Graph", &users, &items, edges)
}

#[allow(clippy::cast_precision_loss)]
fn spread(n: usize, len: usize) -> f32 {
    if len <= 1 {
        0.5
    } else {
        n as f32 / (len - 1) as f32
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn store() -> InteractionStore {
        let mut store = InteractionStore::new();
        store.record_interaction(UserId(1), ItemId(10));
        store.record_interaction(UserId(1), ItemId(10));
        store.record_interaction(UserId(2), ItemId(11));
        store.register_item(ItemId(12));
        store
    }

    #[test]
    fn duplicate_interactions_collapse_into_one_edge() {
        let graph = interaction_graph(&store());
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.nodes_of(NodeKind::User).count(), 2);
        assert_eq!(graph.nodes_of(NodeKind::Item).count(), 3);
    }

    #[test]
    fn layout_puts_users_left_and_items_right() {
        let graph = interaction_graph(&store());
        assert!(graph.nodes_of(NodeKind::User).all(|n| n.position[0] == 0.0));
        let item_ys: Vec<f32> = graph.nodes_of(NodeKind::Item).map(|n| n.position[1]).collect();
        assert_eq!(item_ys, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn same_raw_id_stays_two_nodes() {
        let mut store = InteractionStore::new();
        store.record_interaction(UserId(5), ItemId(5));
        let graph = interaction_graph(&store);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.to_dot().contains("\"u5\" -- \"i5\""));
    }

    #[test]
    fn recommendation_graph_only_shows_recommended_items() {
        let mut recs = BTreeMap::new();
        recs.insert(UserId(1), vec![ItemId(11), ItemId(12)]);
        recs.insert(UserId(2), vec![]);

        let graph = recommendation_graph(&recs);
        assert_eq!(graph.nodes_of(NodeKind::Item).count(), 2);
        assert_eq!(graph.nodes_of(NodeKind::User).count(), 2);
        assert_eq!(
            graph.edges,
            vec![
                Edge { user: UserId(1), item: ItemId(11) },
                Edge { user: UserId(1), item: ItemId(12) },
            ]
        );
    }

    #[test]
    fn dot_and_json_render() {
        let graph = interaction_graph(&store());
        let dot = graph.to_dot();
        assert!(dot.starts_with("graph budgetrec {"));
        assert!(dot.contains("\"i12\" [shape=box];"));

        let json = graph.to_json_pretty().expect("json");
        assert!(json.contains("\"kind\": \"item\""));
        assert!(json.contains("\"generated_at\""));
    }
}
