//! Network topology module.
//!
//! This module turns an editor graph into the normalized topology document:
//! adjacency lookups, node classification and per-network IP planning.

pub mod adjacency;
pub mod rules;
pub mod types;

// Re-export key types and functions for easier access
pub use adjacency::AdjacencyIndex;
pub use rules::{generate_topology, DhcpSource};
pub use types::{
    AddressingMethod, Connections, IpPlan, NetworkInterface, PlanReason, RuleLogEntry,
    TopologyDocument, TopologyEdge, TopologyHost, TopologyNetwork, TopologyNode,
    TopologyService, TopologySummary, TOPOLOGY_VERSION,
};
