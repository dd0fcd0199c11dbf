//! # Range42 - Topology rule engine and deployment export pipeline
//!
//! This library turns an infrastructure graph drawn in the Range42 editor
//! (virtual machines, network segments, routers, DNS/DHCP/load-balancer and
//! container services) into a deployable description of that infrastructure.
//!
//! ## Overview
//!
//! The pipeline works on an immutable snapshot of the graph:
//!
//! - **Topology rule engine**: classifies nodes, decides per network segment
//!   whether addresses come from DHCP or are assigned statically, allocates
//!   static addresses and emits a versioned topology document.
//! - **Infrastructure analyzer**: groups services under the VM that hosts
//!   them and attaches network segments to those groups.
//! - **Artifact generators**: Proxmox provisioning playbook, service
//!   playbook, inventory, per-host compose files, service configs,
//!   deployment guide and helper scripts.
//! - **Export orchestrator**: validates the graph, runs the generators and
//!   assembles a bundle of named text artifacts.
//!
//! ## Architecture
//!
//! - `graph`: nodes, edges and typed node configuration
//! - `ip`: CIDR arithmetic and the lazy host address sequence
//! - `topology`: adjacency index, topology document and addressing rules
//! - `analysis`: deployment group analysis
//! - `generators`: artifact generators and the shared YAML renderer
//! - `export`: validation, bundle types, sinks and orchestration
//! - `config`: project and settings types
//! - `config_loader`: project file loading and settings resolution
//! - `utils`: lenient decoding, naming and unit helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use range42::config::SettingsOverrides;
//! use range42::config_loader::{load_project, resolve_settings};
//! use range42::export::{deliver, export_project, DirectorySink};
//! use std::path::Path;
//!
//! let project = load_project(Path::new("lab.json"))?;
//! let settings = resolve_settings(&project, &SettingsOverrides::default())?;
//!
//! let bundle = export_project(&project, &settings)?;
//! deliver(&bundle, &mut DirectorySink::new("range42_export"))?;
//!
//! // range42_export now contains:
//! // - README.md, metadata.json, topology.json
//! // - ansible/{proxmox-provision,deploy-services,inventory}.yml
//! // - docker-compose/<host>.yml and configs/<service>/...
//! // - scripts/{deploy,cleanup}.sh
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Project Format
//!
//! Projects are the editor's JSON export (YAML is accepted as well):
//!
//! ```json
//! {
//!   "name": "Lab",
//!   "nodes": [
//!     {"id": "net-1", "type": "network-segment",
//!      "data": {"config": {"name": "lan", "cidr": "192.168.1.0/24", "gateway": "192.168.1.1"}}},
//!     {"id": "vm-1", "type": "vm", "parentNode": "net-1",
//!      "data": {"config": {"name": "web", "cpu": 2, "memory": "4GB"}}}
//!   ],
//!   "edges": [{"id": "e1", "source": "net-1", "target": "vm-1"}],
//!   "settings": {"baseUrl": "http://127.0.0.1:8000", "defaultNode": "px-testing"}
//! }
//! ```
//!
//! ## Error Handling
//!
//! The pipeline itself is forgiving: malformed CIDRs, missing fields and
//! failing generators are reported in the bundle metadata instead of
//! aborting. Library error types derive `thiserror::Error`; the loading and
//! command-line layer uses `color_eyre` for error reports with context.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod export;
pub mod generators;
pub mod graph;
pub mod ip;
pub mod topology;
pub mod utils;
