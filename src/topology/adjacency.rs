//! Adjacency index over the editor graph.
//!
//! Edges are folded into source -> targets and target -> sources lists with
//! set semantics: a duplicate edge does not add a second neighbor entry, but
//! first-seen order is kept so every derived document is deterministic.

use crate::graph::{Edge, Node, NodeKind};
use std::collections::{HashMap, HashSet};

/// Neighbor and containment lookups for one graph snapshot
#[derive(Debug, Default, Clone)]
pub struct AdjacencyIndex {
    outgoing: HashMap<String, Vec<String>>,
    incoming: HashMap<String, Vec<String>>,
    members: HashMap<String, Vec<String>>,
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}

impl AdjacencyIndex {
    /// Build the index from the node and edge lists.
    ///
    /// Network membership only considers direct children of
    /// `network-segment` nodes, in node list order.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut index = AdjacencyIndex::default();

        for edge in edges {
            push_unique(
                index.outgoing.entry(edge.source.clone()).or_default(),
                &edge.target,
            );
            push_unique(
                index.incoming.entry(edge.target.clone()).or_default(),
                &edge.source,
            );
        }

        let network_ids: HashSet<&str> = nodes
            .iter()
            .filter(|node| node.kind == NodeKind::NetworkSegment)
            .map(|node| node.id.as_str())
            .collect();

        for id in &network_ids {
            index.members.insert(id.to_string(), Vec::new());
        }

        for node in nodes {
            if let Some(parent) = node.parent.as_deref() {
                if network_ids.contains(parent) {
                    if let Some(list) = index.members.get_mut(parent) {
                        list.push(node.id.clone());
                    }
                }
            }
        }

        index
    }

    /// Targets of edges leaving `id`
    pub fn outgoing(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources of edges arriving at `id`
    pub fn incoming(&self, id: &str) -> &[String] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of incoming and outgoing neighbors, outgoing first
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.outgoing(id)
            .iter()
            .chain(self.incoming(id))
            .map(String::as_str)
            .filter(|neighbor| seen.insert(*neighbor))
            .collect()
    }

    /// Direct members of a network segment in node list order
    pub fn members(&self, network_id: &str) -> &[String] {
        self.members.get(network_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
