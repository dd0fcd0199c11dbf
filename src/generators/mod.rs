//! Deployment artifact generators.
//!
//! Every generator is a pure function from a [`GenerationContext`] to a list
//! of named text artifacts. Generators never touch the filesystem; the export
//! orchestrator collects their output into a bundle.
//!
//! Artifact paths use slugs of node names (see [`UniqueNames`]) so that two
//! hosts named alike still get distinct compose files and inventory entries.

pub mod compose;
pub mod configs;
pub mod guide;
pub mod inventory;
pub mod playbook;
pub mod provision;
pub mod render;
pub mod scripts;
pub mod services;
pub mod templates;

use crate::analysis::InfrastructureAnalysis;
use crate::config::ProjectSettings;
use crate::graph::{Node, VmConfig};
use crate::ip::parse_cidr;
use crate::topology::TopologyDocument;
use crate::utils::{memory_mb_or_default, UniqueNames};

/// First Proxmox VM id handed out; hosts get consecutive ids from here
pub const VMID_BASE: u32 = 100;

/// Directory on each host that receives compose files and service configs
pub const REMOTE_ROOT: &str = "/opt/range42";

/// Inventory names a VM slug must never take
const RESERVED_HOST_NAMES: &[&str] = &[
    inventory::CONTROLLER_HOST,
    inventory::CONTROLLER_GROUP,
    services::VM_GROUP,
    "all",
    "ungrouped",
];

/// Project text safe to place on a single `#` comment line: control
/// characters, newlines included, become spaces.
pub fn comment_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// A generated file, addressed by its path inside the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Artifact {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Errors a single generator can fail with
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot generate {artifact}: {reason}")]
    Invalid { artifact: String, reason: String },
}

/// Resolved machine specification of one host, shared by the provisioning
/// playbook, the inventory and the scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub id: String,
    pub name: String,
    pub vm_id: u32,
    pub os: String,
    pub cpu: u32,
    pub memory_mb: u64,
    /// Static address, when the host's network allocated one
    pub address: Option<String>,
    /// Proxmox `ipconfig0` value for a static address (`ip=a.b.c.d/nn[,gw=...]`)
    pub ip_config: Option<String>,
}

/// Everything a generator may read.
///
/// Slugs are assigned once here, in host/service/network order, so every
/// generator refers to the same node by the same name.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    pub project_name: &'a str,
    pub settings: &'a ProjectSettings,
    pub topology: &'a TopologyDocument,
    pub analysis: &'a InfrastructureAnalysis,
    pub host_names: UniqueNames,
    pub service_names: UniqueNames,
    pub network_names: UniqueNames,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        project_name: &'a str,
        settings: &'a ProjectSettings,
        topology: &'a TopologyDocument,
        analysis: &'a InfrastructureAnalysis,
    ) -> Self {
        let mut host_names = UniqueNames::new();
        for reserved in RESERVED_HOST_NAMES {
            host_names.reserve(reserved);
        }
        for host in &analysis.hosts {
            host_names.add(&host.id, host.name());
        }

        let mut service_names = UniqueNames::new();
        for service in &analysis.services {
            service_names.add(&service.id, service.name());
        }

        let mut network_names = UniqueNames::new();
        for network in &analysis.networks {
            network_names.add(&network.id, network.name());
        }

        GenerationContext {
            project_name,
            settings,
            topology,
            analysis,
            host_names,
            service_names,
            network_names,
        }
    }

    /// Proxmox VM id of a host: the base id plus the host's position
    pub fn vm_id(&self, host_id: &str) -> Option<u32> {
        self.analysis
            .hosts
            .iter()
            .position(|host| host.id == host_id)
            .and_then(|index| u32::try_from(index).ok())
            .map(|index| VMID_BASE + index)
    }

    /// VM ids of all hosts, in host order
    pub fn vm_ids(&self) -> Vec<u32> {
        self.analysis
            .hosts
            .iter()
            .filter_map(|host| self.vm_id(&host.id))
            .collect()
    }

    pub fn host_name(&self, host: &Node) -> String {
        self.host_names.get_or_slug(&host.id)
    }

    pub fn service_name(&self, service: &Node) -> String {
        self.service_names.get_or_slug(&service.id)
    }

    pub fn network_name(&self, network: &Node) -> String {
        self.network_names.get_or_slug(&network.id)
    }

    /// Machine specification of every host, in host order
    pub fn host_specs(&self) -> Vec<HostSpec> {
        self.analysis
            .hosts
            .iter()
            .filter_map(|host| self.host_spec(host))
            .collect()
    }

    /// Machine specification of one host; `None` if the node is not a known host
    pub fn host_spec(&self, host: &Node) -> Option<HostSpec> {
        let vm_id = self.vm_id(&host.id)?;
        let defaults = VmConfig::default();
        let (os, cpu, memory) = match self.topology.host(&host.id) {
            Some(topology_host) => (
                topology_host.os.clone(),
                topology_host.cpu,
                topology_host.memory.clone(),
            ),
            None => (
                defaults.os_or_default().to_string(),
                defaults.cpu_or_default(),
                defaults.memory_or_default().to_string(),
            ),
        };

        Some(HostSpec {
            id: host.id.clone(),
            name: self.host_name(host),
            vm_id,
            os,
            cpu,
            memory_mb: memory_mb_or_default(Some(&memory)),
            address: self.static_address(&host.id).map(str::to_string),
            ip_config: self.ip_config(&host.id),
        })
    }

    fn ip_config(&self, node_id: &str) -> Option<String> {
        let network = self
            .topology
            .networks
            .iter()
            .find(|network| network.ip_plan.allocations.contains_key(node_id))?;
        let address = network.ip_plan.allocations.get(node_id)?;
        let block = parse_cidr(network.cidr.as_deref()?)?;

        let mut config = format!("ip={}/{}", address, block.mask_bits);
        if let Some(gateway) = &network.gateway {
            config.push_str(&format!(",gw={}", gateway));
        }
        Some(config)
    }

    /// Statically allocated address of a node, if its network has one for it
    pub fn static_address(&self, node_id: &str) -> Option<&str> {
        self.topology
            .networks
            .iter()
            .find_map(|network| network.ip_plan.allocations.get(node_id))
            .map(String::as_str)
    }
}

/// Signature shared by all generators
pub type GeneratorFn = fn(&GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError>;

/// A named generator, as run by the export orchestrator
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    pub name: &'static str,
    pub generate: GeneratorFn,
}

/// All deployment generators, in the order their artifacts are produced
pub const GENERATORS: &[Generator] = &[
    Generator {
        name: "provisioning-playbook",
        generate: provision::generate,
    },
    Generator {
        name: "service-playbook",
        generate: services::generate,
    },
    Generator {
        name: "inventory",
        generate: inventory::generate,
    },
    Generator {
        name: "compose",
        generate: compose::generate,
    },
    Generator {
        name: "service-configs",
        generate: configs::generate,
    },
    Generator {
        name: "deployment-guide",
        generate: guide::generate,
    },
    Generator {
        name: "scripts",
        generate: scripts::generate,
    },
];


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_vm_ids_follow_host_order() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let ctx = fixture.context();

        assert_eq!(ctx.vm_id("vm-1"), Some(100));
        assert_eq!(ctx.vm_id("vm-2"), Some(101));
        assert_eq!(ctx.vm_id("app-1"), None);
        assert_eq!(ctx.vm_ids(), vec![100, 101]);
    }

    #[test]
    fn test_names_and_addresses() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let ctx = fixture.context();

        assert_eq!(ctx.host_name(&nodes[1]), "web-server");
        assert_eq!(ctx.service_name(&nodes[3]), "frontend");
        assert_eq!(ctx.network_name(&nodes[0]), "lan");
        assert_eq!(ctx.static_address("vm-1"), Some("192.168.10.10"));
        assert_eq!(ctx.static_address("vm-2"), Some("192.168.10.11"));
    }

    #[test]
    fn test_host_specs() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let specs = fixture.context().host_specs();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "web-server");
        assert_eq!(specs[0].cpu, 4);
        assert_eq!(specs[0].memory_mb, 4096);
        assert_eq!(specs[0].ip_config.as_deref(), Some("ip=192.168.10.10/24,gw=192.168.10.1"));
        assert_eq!(specs[1].cpu, 2);
        assert_eq!(specs[1].memory_mb, 2048);
        assert_eq!(specs[1].os, "Ubuntu 22.04");
    }

    #[test]
    fn test_host_slugs_avoid_inventory_names() {
        use crate::graph::Node;
        use serde_json::json;

        let nodes = vec![
            Node::new("vm-1", "vm", json!({"name": "Proxmox"})),
            Node::new("vm-2", "vm", json!({"name": "vms"})),
            Node::new("vm-3", "vm", json!({"name": "all"})),
        ];
        let fixture = Fixture::new(&nodes, &[]);
        let ctx = fixture.context();

        assert_eq!(ctx.host_name(&nodes[0]), "proxmox-2");
        assert_eq!(ctx.host_name(&nodes[1]), "vms-2");
        assert_eq!(ctx.host_name(&nodes[2]), "all-2");
    }

    #[test]
    fn test_comment_text() {
        assert_eq!(comment_text("Lab\ntouch /tmp/x"), "Lab touch /tmp/x");
        assert_eq!(comment_text("Plain lab"), "Plain lab");
    }

    #[test]
    fn test_every_generator_runs_on_empty_graph() {
        let fixture = Fixture::new(&[], &[]);
        let ctx = fixture.context();

        for generator in GENERATORS {
            assert!((generator.generate)(&ctx).is_ok(), "{} failed", generator.name);
        }
    }
}
