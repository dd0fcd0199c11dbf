//! Export orchestration.
//!
//! An export validates the graph, builds the topology document and the
//! infrastructure analysis, runs every generator and collects the results
//! into an [`ExportBundle`]. Validation findings and generator failures end
//! up in the metadata; they never abort the export.

use super::bundle::*;
use super::sink::{BundleSink, SinkError};
use super::validation::validate_nodes;
use crate::analysis::{analyze_infrastructure, InfrastructureAnalysis};
use crate::config::{Project, ProjectSettings};
use crate::generators::{GenerationContext, Generator, GENERATORS};
use crate::graph::NodeCategory;
use crate::topology::{generate_topology, TopologyDocument};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use std::collections::BTreeMap;

/// Version recorded in the metadata of every bundle
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that stop an export. Only the metadata document can cause one.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize export metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Run the full export pipeline, stamped with the current time.
pub fn export_project(project: &Project, settings: &ProjectSettings) -> Result<ExportBundle, ExportError> {
    export_project_at(project, settings, Utc::now())
}

/// Run the full export pipeline with an explicit export timestamp.
pub fn export_project_at(
    project: &Project,
    settings: &ProjectSettings,
    exported_at: DateTime<Utc>,
) -> Result<ExportBundle, ExportError> {
    export_with_generators(project, settings, exported_at, GENERATORS)
}

pub(crate) fn export_with_generators(
    project: &Project,
    settings: &ProjectSettings,
    exported_at: DateTime<Utc>,
    generators: &[Generator],
) -> Result<ExportBundle, ExportError> {
    let settings = settings.normalized();
    info!(
        "Exporting project '{}' ({} nodes, {} edges)",
        project.name(),
        project.nodes.len(),
        project.edges.len()
    );

    let validation_warnings = validate_nodes(&project.nodes);
    for issue in &validation_warnings {
        warn!("Validation: {}", issue);
    }

    let topology = generate_topology(&project.nodes, &project.edges);
    let analysis = analyze_infrastructure(&project.nodes, &project.edges);

    let mut artifacts = BTreeMap::new();
    let mut generator_failures = Vec::new();
    insert_topology(&topology, &mut artifacts, &mut generator_failures);

    let project_name = project.name();
    let ctx = GenerationContext::new(project_name, &settings, &topology, &analysis);
    run_generators(&ctx, generators, &mut artifacts, &mut generator_failures);

    let mut metadata = base_metadata(project, &settings, ExportKind::Full, exported_at);
    metadata.deployment_groups = group_summaries(&ctx, &analysis);
    metadata.unassigned_services = analysis.unassigned_services.clone();
    metadata.validation_warnings = validation_warnings;
    metadata.generator_failures = generator_failures;

    finish(artifacts, metadata)
}

/// Export only the topology document and its metadata.
pub fn export_topology_only(project: &Project, settings: &ProjectSettings) -> Result<ExportBundle, ExportError> {
    export_topology_only_at(project, settings, Utc::now())
}

pub fn export_topology_only_at(
    project: &Project,
    settings: &ProjectSettings,
    exported_at: DateTime<Utc>,
) -> Result<ExportBundle, ExportError> {
    let settings = settings.normalized();
    info!("Exporting topology of project '{}'", project.name());

    let topology = generate_topology(&project.nodes, &project.edges);
    let mut artifacts = BTreeMap::new();
    let mut generator_failures = Vec::new();
    insert_topology(&topology, &mut artifacts, &mut generator_failures);

    let mut metadata = base_metadata(project, &settings, ExportKind::Topology, exported_at);
    metadata.generator_failures = generator_failures;

    finish(artifacts, metadata)
}

/// Hand a finished bundle to a sink.
pub fn deliver(bundle: &ExportBundle, sink: &mut dyn BundleSink) -> Result<(), SinkError> {
    sink.deliver(bundle)
}

/// Run each generator in order. A failing generator contributes no artifacts
/// and is recorded in `failures`; the others still run.
fn run_generators(
    ctx: &GenerationContext<'_>,
    generators: &[Generator],
    artifacts: &mut BTreeMap<String, String>,
    failures: &mut Vec<GeneratorFailure>,
) {
    for generator in generators {
        match (generator.generate)(ctx) {
            Ok(generated) => {
                info!("Generator {} produced {} artifacts", generator.name, generated.len());
                for artifact in generated {
                    if artifacts.insert(artifact.path.clone(), artifact.content).is_some() {
                        warn!("Artifact {} generated twice; keeping the last one", artifact.path);
                    }
                }
            }
            Err(e) => {
                warn!("Generator {} failed: {}", generator.name, e);
                failures.push(GeneratorFailure {
                    generator: generator.name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

fn insert_topology(
    topology: &TopologyDocument,
    artifacts: &mut BTreeMap<String, String>,
    failures: &mut Vec<GeneratorFailure>,
) {
    match topology.to_json() {
        Ok(json) => {
            artifacts.insert(TOPOLOGY_PATH.to_string(), json);
        }
        Err(e) => {
            warn!("Topology serialization failed: {}", e);
            failures.push(GeneratorFailure {
                generator: "topology".to_string(),
                error: e.to_string(),
            });
        }
    }
}

fn base_metadata(
    project: &Project,
    settings: &ProjectSettings,
    export_type: ExportKind,
    exported_at: DateTime<Utc>,
) -> ExportMetadata {
    let count = |category: NodeCategory| {
        project
            .nodes
            .iter()
            .filter(|node| node.category() == category)
            .count()
    };

    ExportMetadata {
        project_name: project.name().to_string(),
        export_type,
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        generator_version: GENERATOR_VERSION.to_string(),
        node_count: project.nodes.len(),
        edge_count: project.edges.len(),
        host_count: count(NodeCategory::Host),
        service_count: count(NodeCategory::Service),
        network_count: count(NodeCategory::Network),
        deployment_groups: Vec::new(),
        settings: settings.clone(),
        validation_warnings: Vec::new(),
        generator_failures: Vec::new(),
        unassigned_services: Vec::new(),
        artifacts: Vec::new(),
    }
}

fn group_summaries(ctx: &GenerationContext<'_>, analysis: &InfrastructureAnalysis) -> Vec<GroupSummary> {
    analysis
        .deployment_groups
        .values()
        .map(|group| GroupSummary {
            host_id: group.host.id.clone(),
            host_name: ctx.host_name(&group.host),
            services: group.services.iter().map(|s| s.id.clone()).collect(),
            networks: group.networks.iter().map(|n| n.id.clone()).collect(),
        })
        .collect()
}

fn finish(
    mut artifacts: BTreeMap<String, String>,
    mut metadata: ExportMetadata,
) -> Result<ExportBundle, ExportError> {
    metadata.artifacts = artifacts
        .keys()
        .cloned()
        .chain(std::iter::once(METADATA_PATH.to_string()))
        .collect();
    metadata.artifacts.sort();

    let json = serde_json::to_string_pretty(&metadata)?;
    artifacts.insert(METADATA_PATH.to_string(), json);

    info!("Export bundle ready with {} artifacts", artifacts.len());
    Ok(ExportBundle { artifacts, metadata })
}
