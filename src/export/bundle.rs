//! Export bundle and metadata types.

use super::validation::ValidationIssue;
use crate::config::ProjectSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const METADATA_PATH: &str = "metadata.json";
pub const TOPOLOGY_PATH: &str = "topology.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Topology, playbooks, compose files, configs, guide and scripts
    Full,
    /// Topology document and metadata only
    Topology,
}

/// A generator that failed; its artifacts are missing from the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorFailure {
    pub generator: String,
    pub error: String,
}

/// Summary of one deployment group as recorded in the metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub host_id: String,
    pub host_name: String,
    pub services: Vec<String>,
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub project_name: String,
    pub export_type: ExportKind,
    /// RFC 3339 UTC timestamp
    pub exported_at: String,
    pub generator_version: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub host_count: usize,
    pub service_count: usize,
    pub network_count: usize,
    pub deployment_groups: Vec<GroupSummary>,
    pub settings: ProjectSettings,
    pub validation_warnings: Vec<ValidationIssue>,
    pub generator_failures: Vec<GeneratorFailure>,
    pub unassigned_services: Vec<String>,
    /// Paths of every artifact in the bundle, `metadata.json` included
    pub artifacts: Vec<String>,
}

/// Named text artifacts ready for packaging, keyed by bundle path
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub artifacts: BTreeMap<String, String>,
    pub metadata: ExportMetadata,
}

impl ExportBundle {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.artifacts.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
