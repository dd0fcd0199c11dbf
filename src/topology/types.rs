//! Topology document types.
//!
//! The topology document is the canonical JSON description of a graph,
//! independent of any generated deployment artifact. Field names are part of
//! the exported contract and serialize in camelCase; `version` allows later
//! migrations.

use crate::graph::Position;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Current topology document schema version
pub const TOPOLOGY_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyDocument {
    pub version: u32,
    pub summary: TopologySummary,
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
    pub networks: Vec<TopologyNetwork>,
    pub hosts: Vec<TopologyHost>,
    pub services: Vec<TopologyService>,
    /// Log of the addressing rules applied during generation
    pub rules: Vec<RuleLogEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub networks: usize,
    pub hosts: usize,
    pub services: usize,
}

/// Direct neighbor ids of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: Option<String>,
    pub status: Option<String>,
    pub parent: Option<String>,
    pub position: Option<Position>,
    pub config: Map<String, Value>,
    pub connections: Connections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

/// How hosts on a network obtain their address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMethod {
    Dhcp,
    Static,
    Unknown,
}

/// Why an addressing method was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
    DhcpDetected,
    NoDhcpDetected,
    InvalidCidr,
}

/// Addressing decision for one network segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPlan {
    pub method: AddressingMethod,
    pub reason: PlanReason,
    /// Node id -> assigned address; only populated for static networks
    pub allocations: BTreeMap<String, String>,
}

impl IpPlan {
    pub fn dhcp() -> Self {
        IpPlan {
            method: AddressingMethod::Dhcp,
            reason: PlanReason::DhcpDetected,
            allocations: BTreeMap::new(),
        }
    }

    pub fn invalid_cidr() -> Self {
        IpPlan {
            method: AddressingMethod::Unknown,
            reason: PlanReason::InvalidCidr,
            allocations: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNetwork {
    pub id: String,
    pub name: String,
    pub cidr: Option<String>,
    pub gateway: Option<String>,
    pub vlan: Option<u32>,
    /// The network itself is flagged as DHCP-served
    pub dhcp_flag: bool,
    pub members: Vec<String>,
    pub ip_plan: IpPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub network_id: String,
    pub method: AddressingMethod,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyHost {
    pub id: String,
    pub name: String,
    pub os: String,
    pub cpu: u32,
    pub memory: String,
    pub parent_network_id: Option<String>,
    pub connections: Connections,
    pub network_interfaces: Vec<NetworkInterface>,
}

impl TopologyHost {
    /// First statically assigned address of this host
    pub fn static_address(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .find(|iface| iface.method == AddressingMethod::Static)
            .and_then(|iface| iface.address.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    pub parent_network_id: Option<String>,
    pub connections: Connections,
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLogEntry {
    pub id: String,
    pub description: String,
    pub scope: String,
    pub version: u32,
}

impl TopologyDocument {
    pub fn host(&self, id: &str) -> Option<&TopologyHost> {
        self.hosts.iter().find(|host| host.id == id)
    }

    pub fn network(&self, id: &str) -> Option<&TopologyNetwork> {
        self.networks.iter().find(|network| network.id == id)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
