//! Configuration completeness checks.
//!
//! Validation only looks at presence and format. Every finding is a warning
//! recorded in the export metadata; nothing here stops an export.

use crate::graph::{Node, NodeConfig};
use crate::ip::parse_cidr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single validation finding for one node field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub node_id: String,
    pub node_type: String,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(node: &Node, field: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            node_id: node.id.clone(),
            node_type: node.kind.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.node_type, self.node_id, self.message)
    }
}

/// Validate every node, in node order.
pub fn validate_nodes(nodes: &[Node]) -> Vec<ValidationIssue> {
    nodes.iter().flat_map(validate_node).collect()
}

/// Validate one node's configuration for its type.
pub fn validate_node(node: &Node) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if node.config.name().is_none() {
        issues.push(ValidationIssue::new(node, "name", "Name is required"));
    }

    match &node.config {
        NodeConfig::Vm(vm) => {
            if vm.cpu.map_or(true, |cpu| cpu < 1) {
                issues.push(ValidationIssue::new(node, "cpu", "CPU count must be at least 1"));
            }
            if vm.memory.is_none() {
                issues.push(ValidationIssue::new(node, "memory", "Memory is required"));
            }
        }
        NodeConfig::Docker(docker) => {
            if docker.image.is_none() {
                issues.push(ValidationIssue::new(node, "image", "Container image is required"));
            }
        }
        NodeConfig::Network(network) => match network.cidr.as_deref() {
            None => issues.push(ValidationIssue::new(node, "cidr", "CIDR is required")),
            Some(cidr) if parse_cidr(cidr).is_none() => issues.push(ValidationIssue::new(
                node,
                "cidr",
                format!("Invalid CIDR format '{}'", cidr),
            )),
            Some(_) => {}
        },
        _ => {}
    }

    issues
}
