//! Ansible inventory.
//!
//! The `proxmox` group holds a single controller-local host that talks to the
//! Proxmox API; the `vms` group lists every VM with its machine specification.

use super::render::render_yaml;
use super::services::VM_GROUP;
use super::{Artifact, GenerateError, GenerationContext, HostSpec};
use serde_yaml::{Mapping, Value};

pub const INVENTORY_PATH: &str = "ansible/inventory.yml";

/// Group and host name of the controller entry that drives the Proxmox API
pub const CONTROLLER_GROUP: &str = "proxmox";
pub const CONTROLLER_HOST: &str = "proxmox";

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Mapping {
    entries
        .into_iter()
        .map(|(key, value)| (Value::from(key), value))
        .collect()
}

fn vm_entry(spec: &HostSpec) -> Value {
    let ansible_host = spec.address.clone().unwrap_or_else(|| spec.name.clone());
    Value::Mapping(mapping([
        ("ansible_host", Value::from(ansible_host)),
        ("vm_id", Value::from(spec.vm_id)),
        ("cpu", Value::from(spec.cpu)),
        ("memory", Value::from(spec.memory_mb)),
        ("os", Value::from(spec.os.as_str())),
    ]))
}

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    let controller = mapping([
        ("ansible_connection", Value::from("local")),
        ("proxmox_node", Value::from(ctx.settings.default_node.as_str())),
        ("range42_api", Value::from(ctx.settings.base_url.as_str())),
    ]);
    let proxmox = mapping([(
        "hosts",
        Value::Mapping(mapping([(CONTROLLER_HOST, Value::Mapping(controller))])),
    )]);

    let vm_hosts: Mapping = ctx
        .host_specs()
        .iter()
        .map(|spec| (Value::from(spec.name.as_str()), vm_entry(spec)))
        .collect();
    let vms = mapping([("hosts", Value::Mapping(vm_hosts))]);

    let children = mapping([
        (CONTROLLER_GROUP, Value::Mapping(proxmox)),
        (VM_GROUP, Value::Mapping(vms)),
    ]);
    let document = mapping([(
        "all",
        Value::Mapping(mapping([("children", Value::Mapping(children))])),
    )]);

    Ok(vec![Artifact::new(
        INVENTORY_PATH,
        render_yaml(&Value::Mapping(document)),
    )])
}
