//! Node and edge definitions for the editor graph snapshot.
//!
//! The editor hands over nodes in its own JSON layout (`type`, `data.label`,
//! `data.config`, `parentNode`). `Node` keeps that layout on the wire through
//! `RawNode`, and additionally carries the decoded, typed configuration.

use super::config::NodeConfig;
use crate::utils::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Node type tag as emitted by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Vm,
    NetworkSegment,
    Router,
    Switch,
    Firewall,
    Dns,
    Dhcp,
    LoadBalancer,
    Docker,
    /// Any tag this crate does not know about; kept verbatim.
    Other(String),
}

/// Coarse classification shared by the rule engine and the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Network,
    Host,
    Service,
    Infrastructure,
}

/// Service node types that can be deployed as containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Docker,
    Dns,
    Dhcp,
    LoadBalancer,
}

impl NodeKind {
    /// Get the editor tag for this node type
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Vm => "vm",
            NodeKind::NetworkSegment => "network-segment",
            NodeKind::Router => "router",
            NodeKind::Switch => "switch",
            NodeKind::Firewall => "firewall",
            NodeKind::Dns => "dns",
            NodeKind::Dhcp => "dhcp",
            NodeKind::LoadBalancer => "loadbalancer",
            NodeKind::Docker => "docker",
            NodeKind::Other(tag) => tag,
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::NetworkSegment => NodeCategory::Network,
            NodeKind::Vm => NodeCategory::Host,
            NodeKind::Docker | NodeKind::Dns | NodeKind::Dhcp | NodeKind::LoadBalancer => {
                NodeCategory::Service
            }
            NodeKind::Router | NodeKind::Switch | NodeKind::Firewall | NodeKind::Other(_) => {
                NodeCategory::Infrastructure
            }
        }
    }

    pub fn service_kind(&self) -> Option<ServiceKind> {
        match self {
            NodeKind::Docker => Some(ServiceKind::Docker),
            NodeKind::Dns => Some(ServiceKind::Dns),
            NodeKind::Dhcp => Some(ServiceKind::Dhcp),
            NodeKind::LoadBalancer => Some(ServiceKind::LoadBalancer),
            _ => None,
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "vm" => NodeKind::Vm,
            "network-segment" => NodeKind::NetworkSegment,
            "router" => NodeKind::Router,
            "switch" => NodeKind::Switch,
            "firewall" => NodeKind::Firewall,
            "dns" => NodeKind::Dns,
            "dhcp" => NodeKind::Dhcp,
            "loadbalancer" => NodeKind::LoadBalancer,
            "docker" => NodeKind::Docker,
            _ => NodeKind::Other(tag),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        NodeKind::from(tag.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Docker => "docker",
            ServiceKind::Dns => "dns",
            ServiceKind::Dhcp => "dhcp",
            ServiceKind::LoadBalancer => "loadbalancer",
        }
    }
}

/// Canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// A graph node with both its raw editor configuration and the typed view of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub status: Option<String>,
    /// Containing node (e.g. the network segment a VM sits in)
    pub parent: Option<String>,
    pub position: Option<Position>,
    /// Configuration exactly as the editor provided it
    pub raw_config: Map<String, Value>,
    /// Typed configuration decoded from `raw_config`
    pub config: NodeConfig,
}

impl Node {
    /// Build a node from its id, type tag and raw configuration.
    pub fn new(id: impl Into<String>, kind: impl Into<NodeKind>, raw_config: Value) -> Self {
        let kind = kind.into();
        let raw_config = match raw_config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let config = NodeConfig::decode(&kind, &raw_config);
        Node {
            id: id.into(),
            kind,
            label: None,
            status: None,
            parent: None,
            position: None,
            raw_config,
            config,
        }
    }

    /// Place the node inside a parent node
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Configured name, falling back to the node id.
    pub fn name(&self) -> &str {
        self.config.name().unwrap_or(&self.id)
    }

    pub fn category(&self) -> NodeCategory {
        self.kind.category()
    }

    pub fn is_vm(&self) -> bool {
        self.kind == NodeKind::Vm
    }
}

/// Wire layout of a node as exported by the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    data: RawNodeData,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string")]
    parent_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    config: Map<String, Value>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let config = NodeConfig::decode(&raw.kind, &raw.data.config);
        Node {
            id: raw.id,
            kind: raw.kind,
            label: raw.data.label,
            status: raw.data.status,
            parent: raw.parent_node,
            position: raw.position,
            raw_config: raw.data.config,
            config,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        RawNode {
            id: node.id,
            kind: node.kind,
            data: RawNodeData {
                label: node.label,
                status: node.status,
                config: node.raw_config,
            },
            parent_node: node.parent,
            position: node.position,
        }
    }
}

/// Directed dependency/connectivity relation between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_editor_node_layout() {
        let node: Node = serde_json::from_value(json!({
            "id": "vm-1",
            "type": "vm",
            "data": {"label": "Web", "status": "running", "config": {"name": "web-01", "cpu": 4}},
            "parentNode": "net-1",
            "position": {"x": 10.0, "y": 20.5}
        }))
        .unwrap();

        assert_eq!(node.kind, NodeKind::Vm);
        assert_eq!(node.label.as_deref(), Some("Web"));
        assert_eq!(node.parent.as_deref(), Some("net-1"));
        assert_eq!(node.name(), "web-01");
        assert_eq!(node.raw_config.get("cpu"), Some(&json!(4)));
        assert_eq!(node.position, Some(Position { x: 10.0, y: 20.5 }));
    }

    #[test]
    fn test_minimal_node_and_unknown_type() {
        let node: Node = serde_json::from_value(json!({"id": "x", "type": "printer"})).unwrap();

        assert_eq!(node.kind, NodeKind::Other("printer".to_string()));
        assert_eq!(node.category(), NodeCategory::Infrastructure);
        assert!(node.raw_config.is_empty());
        assert_eq!(node.name(), "x");
    }

    #[test]
    fn test_node_serializes_back_to_editor_layout() {
        let node = Node::new("dns-1", "dns", json!({"name": "ns"})).with_parent("net-1");
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["type"], json!("dns"));
        assert_eq!(value["parentNode"], json!("net-1"));
        assert_eq!(value["data"]["config"]["name"], json!("ns"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(NodeKind::from("network-segment").category(), NodeCategory::Network);
        assert_eq!(NodeKind::from("loadbalancer").category(), NodeCategory::Service);
        assert_eq!(NodeKind::from("firewall").category(), NodeCategory::Infrastructure);
        assert_eq!(NodeKind::Dhcp.service_kind(), Some(ServiceKind::Dhcp));
        assert_eq!(NodeKind::Vm.service_kind(), None);
    }
}
