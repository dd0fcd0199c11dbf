//! Infrastructure analyzer.
//!
//! Groups services under the virtual machine that hosts them and attaches
//! network segments to those groups. The classification deliberately does
//! not reuse the topology document so the two can change independently.

use crate::graph::{index_nodes, Edge, Node, NodeCategory};
use crate::topology::AdjacencyIndex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Services and networks attributed to one hosting VM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentGroup {
    pub host: Node,
    pub services: Vec<Node>,
    pub networks: Vec<Node>,
}

impl DeploymentGroup {
    fn new(host: Node) -> Self {
        DeploymentGroup {
            host,
            services: Vec::new(),
            networks: Vec::new(),
        }
    }
}

/// Result of the infrastructure analysis for one export call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureAnalysis {
    pub networks: Vec<Node>,
    pub hosts: Vec<Node>,
    pub services: Vec<Node>,
    /// Routers, switches, firewalls and unknown node types
    pub networking: Vec<Node>,
    /// Deployment groups keyed by host node id
    pub deployment_groups: BTreeMap<String, DeploymentGroup>,
    /// Services without a VM dependency; they are not deployed anywhere
    pub unassigned_services: Vec<String>,
}

impl InfrastructureAnalysis {
    /// Deployment groups that have at least one service to deploy
    pub fn groups_with_services(&self) -> impl Iterator<Item = &DeploymentGroup> {
        self.deployment_groups
            .values()
            .filter(|group| !group.services.is_empty())
    }

    /// Host node id owning the given service, if any
    pub fn host_of_service(&self, service_id: &str) -> Option<&str> {
        self.deployment_groups
            .iter()
            .find(|(_, group)| group.services.iter().any(|s| s.id == service_id))
            .map(|(host_id, _)| host_id.as_str())
    }
}

/// Analyze a graph snapshot into deployment groups.
///
/// A service's dependencies are the sources of edges pointing at it. The VM
/// with the lowest node id among them hosts the service. A network joins
/// every existing group whose host is one of its dependents (targets of the
/// network's edges, or nodes contained in the network).
pub fn analyze_infrastructure(nodes: &[Node], edges: &[Edge]) -> InfrastructureAnalysis {
    let nodes_by_id = index_nodes(nodes);
    let adjacency = AdjacencyIndex::build(nodes, edges);
    let mut analysis = InfrastructureAnalysis::default();

    for node in nodes {
        match node.category() {
            NodeCategory::Network => analysis.networks.push(node.clone()),
            NodeCategory::Host => analysis.hosts.push(node.clone()),
            NodeCategory::Service => analysis.services.push(node.clone()),
            NodeCategory::Infrastructure => analysis.networking.push(node.clone()),
        }
    }

    for service in &analysis.services {
        let host = adjacency
            .incoming(&service.id)
            .iter()
            .filter_map(|id| nodes_by_id.get(id.as_str()))
            .filter(|node| node.is_vm())
            .min_by(|a, b| a.id.cmp(&b.id));

        match host {
            Some(host) => {
                log::debug!("Service {} deploys on host {}", service.id, host.id);
                analysis
                    .deployment_groups
                    .entry(host.id.clone())
                    .or_insert_with(|| DeploymentGroup::new((*host).clone()))
                    .services
                    .push(service.clone());
            }
            None => {
                log::warn!(
                    "Service {} ({}) has no VM dependency and will not be deployed",
                    service.name(),
                    service.id
                );
                analysis.unassigned_services.push(service.id.clone());
            }
        }
    }

    for network in &analysis.networks {
        let dependents = adjacency
            .outgoing(&network.id)
            .iter()
            .chain(adjacency.members(&network.id));

        for dependent in dependents {
            if let Some(group) = analysis.deployment_groups.get_mut(dependent) {
                if !group.networks.iter().any(|n| n.id == network.id) {
                    group.networks.push(network.clone());
                }
            }
        }
    }

    analysis
}
