//! Proxmox provisioning playbook.
//!
//! One play against the `proxmox` inventory host: for every VM a create task
//! and a start task through `community.general.proxmox_kvm`.

use super::playbook::{Play, Task};
use super::render::to_yaml;
use super::{comment_text, Artifact, GenerateError, GenerationContext, HostSpec};
use serde_yaml::{Mapping, Value};

pub const PROVISION_PLAYBOOK_PATH: &str = "ansible/proxmox-provision.yml";

const KVM_MODULE: &str = "community.general.proxmox_kvm";
const DEFAULT_BRIDGE: &str = "virtio,bridge=vmbr0";

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    let mut play = Play::new("Provision Range42 virtual machines", "proxmox")
        .var("proxmox_node", ctx.settings.default_node.as_str())
        .var("range42_api", ctx.settings.base_url.as_str());

    for spec in ctx.host_specs() {
        play.tasks.push(create_task(&spec));
        play.tasks.push(start_task(&spec));
    }

    let header = format!("# Provisioning playbook for {}\n", comment_text(ctx.project_name));
    let body = to_yaml(&vec![play])?;
    Ok(vec![Artifact::new(PROVISION_PLAYBOOK_PATH, header + &body)])
}

fn api_task(name: String, spec: &HostSpec) -> Task {
    Task::new(name, KVM_MODULE)
        .arg("api_host", "{{ proxmox_api_host }}")
        .arg("api_user", "{{ proxmox_api_user }}")
        .arg("api_password", "{{ proxmox_api_password }}")
        .arg("node", "{{ proxmox_node }}")
        .arg("vmid", spec.vm_id)
}

fn create_task(spec: &HostSpec) -> Task {
    let mut net = Mapping::new();
    net.insert(Value::from("net0"), Value::from(DEFAULT_BRIDGE));

    let mut task = api_task(format!("Create VM {}", spec.name), spec)
        .arg("name", spec.name.as_str())
        .arg("description", spec.os.as_str())
        .arg("cores", spec.cpu)
        .arg("memory", spec.memory_mb)
        .arg("net", Value::Mapping(net));

    if let Some(ip_config) = &spec.ip_config {
        let mut ipconfig = Mapping::new();
        ipconfig.insert(Value::from("ipconfig0"), Value::from(ip_config.as_str()));
        task = task.arg("ipconfig", Value::Mapping(ipconfig));
    }

    task.arg("state", "present")
}

fn start_task(spec: &HostSpec) -> Task {
    api_task(format!("Start VM {}", spec.name), spec).arg("state", "started")
}
