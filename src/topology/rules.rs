//! Topology rule engine.
//!
//! Builds the topology document from a graph snapshot and applies the
//! addressing rule to every network segment:
//!
//! 1. **DHCP** when the segment is flagged `dhcp`, contains a DHCP server, or
//!    is directly connected to one (first match wins).
//! 2. **Static** otherwise: the gateway and the first ten offsets of the block
//!    are reserved, and VM members receive consecutive free addresses in
//!    member order.
//! 3. **Unknown** when the CIDR does not parse.

use super::adjacency::AdjacencyIndex;
use super::types::*;
use crate::graph::{index_nodes, Edge, NetworkConfig, Node, NodeCategory, NodeKind};
use crate::ip::{host_sequence, integer_to_ip, ip_to_integer, parse_cidr, HostSequenceOptions};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Offset from the network address where static allocation starts
pub const STATIC_START_OFFSET: u32 = 10;

/// Identifier of the addressing rule recorded in the rule log
pub const ADDRESSING_RULE_ID: &str = "net-001";

/// Where DHCP service for a network was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpSource {
    /// The network configuration sets `dhcp: true`
    Flag,
    /// A DHCP node sits inside the network
    Child,
    /// A DHCP node is connected to the network by an edge
    Neighbor,
}

/// Generate the topology document for a graph snapshot.
///
/// The input is never modified; calling this twice on the same graph yields
/// identical documents.
pub fn generate_topology(nodes: &[Node], edges: &[Edge]) -> TopologyDocument {
    let nodes_by_id = index_nodes(nodes);
    let adjacency = AdjacencyIndex::build(nodes, edges);

    let connections_of = |id: &str| Connections {
        incoming: adjacency.incoming(id).to_vec(),
        outgoing: adjacency.outgoing(id).to_vec(),
    };

    let networks: Vec<&Node> = nodes
        .iter()
        .filter(|n| n.category() == NodeCategory::Network)
        .collect();

    let mut hosts: Vec<TopologyHost> = nodes
        .iter()
        .filter(|n| n.category() == NodeCategory::Host)
        .map(|host| {
            let vm = host.config.as_vm().cloned().unwrap_or_default();
            TopologyHost {
                id: host.id.clone(),
                name: host.name().to_string(),
                os: vm.os_or_default().to_string(),
                cpu: vm.cpu_or_default(),
                memory: vm.memory_or_default().to_string(),
                parent_network_id: host.parent.clone(),
                connections: connections_of(host.id.as_str()),
                network_interfaces: Vec::new(),
            }
        })
        .collect();

    let services: Vec<TopologyService> = nodes
        .iter()
        .filter(|n| n.category() == NodeCategory::Service)
        .map(|service| TopologyService {
            id: service.id.clone(),
            service_type: service.kind.to_string(),
            name: service.name().to_string(),
            parent_network_id: service.parent.clone(),
            connections: connections_of(service.id.as_str()),
            config: service.raw_config.clone(),
        })
        .collect();

    let host_positions: HashMap<String, usize> = hosts
        .iter()
        .enumerate()
        .map(|(i, host)| (host.id.clone(), i))
        .collect();

    let mut topology_networks = Vec::with_capacity(networks.len());
    for network in &networks {
        let config = network.config.as_network().cloned().unwrap_or_default();
        let members = adjacency.members(&network.id);

        let plan = match detect_dhcp(network, &config, nodes, &nodes_by_id, &adjacency) {
            Some(source) => {
                log::debug!("Network {} uses DHCP ({:?})", network.id, source);
                IpPlan::dhcp()
            }
            None => plan_static_addresses(network, &config, members, &nodes_by_id),
        };

        for member in members {
            if let Some(&position) = host_positions.get(member) {
                let address = match plan.method {
                    AddressingMethod::Static => plan.allocations.get(member).cloned(),
                    _ => None,
                };
                hosts[position].network_interfaces.push(NetworkInterface {
                    network_id: network.id.clone(),
                    method: plan.method,
                    address,
                });
            }
        }

        topology_networks.push(TopologyNetwork {
            id: network.id.clone(),
            name: network.name().to_string(),
            cidr: config.cidr.clone(),
            gateway: config.gateway.clone(),
            vlan: config.vlan,
            dhcp_flag: config.dhcp,
            members: members.to_vec(),
            ip_plan: plan,
        });
    }

    TopologyDocument {
        version: TOPOLOGY_VERSION,
        summary: TopologySummary {
            node_count: nodes.len(),
            edge_count: edges.len(),
            networks: topology_networks.len(),
            hosts: hosts.len(),
            services: services.len(),
        },
        nodes: nodes
            .iter()
            .map(|n| TopologyNode {
                id: n.id.clone(),
                node_type: n.kind.to_string(),
                label: n.label.clone(),
                status: n.status.clone(),
                parent: n.parent.clone(),
                position: n.position,
                config: n.raw_config.clone(),
                connections: connections_of(n.id.as_str()),
            })
            .collect(),
        edges: edges
            .iter()
            .map(|e| TopologyEdge {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                label: e.label.clone(),
            })
            .collect(),
        networks: topology_networks,
        hosts,
        services,
        rules: vec![addressing_rule()],
    }
}

/// Decide whether a DHCP server serves this network.
pub fn detect_dhcp(
    network: &Node,
    config: &NetworkConfig,
    nodes: &[Node],
    nodes_by_id: &HashMap<&str, &Node>,
    adjacency: &AdjacencyIndex,
) -> Option<DhcpSource> {
    if config.dhcp {
        return Some(DhcpSource::Flag);
    }

    let has_dhcp_child = nodes
        .iter()
        .any(|n| n.kind == NodeKind::Dhcp && n.parent.as_deref() == Some(network.id.as_str()));
    if has_dhcp_child {
        return Some(DhcpSource::Child);
    }

    let has_dhcp_neighbor = adjacency
        .neighbors(&network.id)
        .into_iter()
        .filter_map(|id| nodes_by_id.get(id))
        .any(|n| n.kind == NodeKind::Dhcp);
    if has_dhcp_neighbor {
        return Some(DhcpSource::Neighbor);
    }

    None
}

/// Allocate static addresses to the VM members of a network.
///
/// When the block runs out of addresses the remaining VMs are left without
/// one; this is logged but not treated as an error.
pub fn plan_static_addresses(
    network: &Node,
    config: &NetworkConfig,
    members: &[String],
    nodes_by_id: &HashMap<&str, &Node>,
) -> IpPlan {
    let Some(block) = config.cidr.as_deref().and_then(parse_cidr) else {
        log::warn!(
            "Network {} has no valid CIDR ({:?}); addressing method unknown",
            network.id,
            config.cidr
        );
        return IpPlan::invalid_cidr();
    };

    let mut skip = HashSet::new();
    if let Some(gateway) = config.gateway.as_deref() {
        let gateway = ip_to_integer(gateway);
        if block.contains_usable(gateway) {
            skip.insert(gateway);
        }
    }

    let start_from = block
        .network_address
        .saturating_add(STATIC_START_OFFSET)
        .max(block.first_usable_address);
    let mut addresses = host_sequence(
        &block,
        HostSequenceOptions {
            skip,
            start_from: Some(start_from),
        },
    );

    let mut allocations = BTreeMap::new();
    let mut unallocated = Vec::new();
    for member in members {
        let Some(node) = nodes_by_id.get(member.as_str()) else {
            continue;
        };
        if !node.is_vm() {
            continue;
        }
        match addresses.next() {
            Some(address) => {
                allocations.insert(member.clone(), integer_to_ip(address));
            }
            None => unallocated.push(member.as_str()),
        }
    }

    if !unallocated.is_empty() {
        log::warn!(
            "Network {} ({}) ran out of addresses; no static IP for: {}",
            network.id,
            block,
            unallocated.join(", ")
        );
    }

    IpPlan {
        method: AddressingMethod::Static,
        reason: PlanReason::NoDhcpDetected,
        allocations,
    }
}

fn addressing_rule() -> RuleLogEntry {
    RuleLogEntry {
        id: ADDRESSING_RULE_ID.to_string(),
        description: "If a VM is inside a network segment and DHCP is present, set interface \
                      method to dhcp; else assign static IP from CIDR."
            .to_string(),
        scope: "network-segment".to_string(),
        version: 1,
    }
}
