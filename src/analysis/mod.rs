//! Infrastructure analysis for artifact generation.
//!
//! Builds deployment groups (a hosting VM with its services and networks)
//! from the graph's dependency edges.

pub mod infrastructure;

pub use infrastructure::{analyze_infrastructure, DeploymentGroup, InfrastructureAnalysis};
