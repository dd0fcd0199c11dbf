//! Export pipeline: validation, generation and bundle delivery.

pub mod bundle;
pub mod orchestrator;
pub mod sink;
pub mod validation;

pub use bundle::{ExportBundle, ExportKind, ExportMetadata, GeneratorFailure, GroupSummary};
pub use orchestrator::{
    deliver, export_project, export_project_at, export_topology_only, export_topology_only_at,
    ExportError, GENERATOR_VERSION,
};
pub use sink::{BundleSink, DirectorySink, SinkError};
pub use validation::{validate_node, validate_nodes, ValidationIssue};
