//! Graph model produced by the infrastructure editor.
//!
//! A graph is a snapshot of typed nodes and directed edges. The export
//! pipeline treats it as read-only input for the duration of one export call.

pub mod config;
pub mod types;

pub use config::{
    DeviceConfig, DhcpConfig, DnsConfig, DnsRecord, DockerConfig, LoadBalancerConfig,
    NetworkConfig, NodeConfig, VmConfig,
};
pub use types::{Edge, Node, NodeCategory, NodeKind, Position, ServiceKind};

use std::collections::HashMap;

/// Index nodes by id. When ids collide the last node wins.
pub fn index_nodes(nodes: &[Node]) -> HashMap<&str, &Node> {
    nodes.iter().map(|node| (node.id.as_str(), node)).collect()
}
