//! Deployment guide (`README.md`).
//!
//! Fixed prose plus one section per deployment group. The guide carries no
//! timestamps so repeated exports of the same graph produce the same text.

use super::compose::compose_path;
use super::{comment_text, Artifact, GenerateError, GenerationContext};
use crate::analysis::DeploymentGroup;
use crate::graph::NodeConfig;

pub const GUIDE_PATH: &str = "README.md";

const PREREQUISITES: &str = "\
## Prerequisites

- Ansible 2.14 or newer with the `community.general` collection
- Access to the Proxmox API (`proxmox_api_host`, `proxmox_api_user`, `proxmox_api_password`)
- SSH access to the provisioned VMs with sudo rights
";

const LAYOUT: &str = "\
## Bundle layout

| Path | Contents |
|------|----------|
| `ansible/proxmox-provision.yml` | Creates and starts the virtual machines |
| `ansible/deploy-services.yml` | Installs Docker and starts the service stacks |
| `ansible/inventory.yml` | Proxmox controller and VM inventory |
| `docker-compose/` | One compose file per host running services |
| `configs/` | Service configuration files (DNS, DHCP, load balancers) |
| `scripts/` | Deploy and cleanup helpers |
| `topology.json` | Normalized topology with the IP plan |
| `metadata.json` | Export summary and warnings |
";

const STEPS: &str = "\
## Deployment

1. Provision the virtual machines:

   ```sh
   ansible-playbook -i ansible/inventory.yml ansible/proxmox-provision.yml
   ```

2. Deploy the services once the VMs are reachable:

   ```sh
   ansible-playbook -i ansible/inventory.yml ansible/deploy-services.yml
   ```

`scripts/deploy.sh` runs both steps in order. `scripts/cleanup.sh` stops the
service stacks and destroys the virtual machines.
";

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    let analysis = ctx.analysis;
    let mut guide = String::new();

    guide.push_str(&format!("# {} deployment\n", comment_text(ctx.project_name)));
    guide.push('\n');
    guide.push_str(&format!(
        "Generated by range42 {} for Proxmox node `{}` (API `{}`).\n",
        env!("CARGO_PKG_VERSION"),
        ctx.settings.default_node,
        ctx.settings.base_url,
    ));
    guide.push('\n');
    guide.push_str("## Overview\n");
    guide.push('\n');
    guide.push_str(&format!("- Networks: {}\n", analysis.networks.len()));
    guide.push_str(&format!("- Virtual machines: {}\n", analysis.hosts.len()));
    guide.push_str(&format!("- Services: {}\n", analysis.services.len()));
    guide.push_str(&format!("- Deployment groups: {}\n", analysis.groups_with_services().count()));
    guide.push('\n');

    guide.push_str(PREREQUISITES);
    guide.push('\n');
    guide.push_str(LAYOUT);
    guide.push('\n');
    guide.push_str(STEPS);

    guide.push('\n');
    guide.push_str("## Deployment groups\n");
    let mut any_group = false;
    for group in analysis.groups_with_services() {
        any_group = true;
        guide.push('\n');
        write_group(ctx, group, &mut guide);
    }
    if !any_group {
        guide.push('\n');
        guide.push_str("No services are attached to a virtual machine.\n");
    }

    if !analysis.unassigned_services.is_empty() {
        guide.push('\n');
        guide.push_str("## Unassigned services\n");
        guide.push('\n');
        guide.push_str("These services have no virtual machine dependency and are not deployed:\n");
        guide.push('\n');
        for id in &analysis.unassigned_services {
            guide.push_str(&format!("- `{}`\n", id));
        }
    }

    Ok(vec![Artifact::new(GUIDE_PATH, guide)])
}

fn write_group(ctx: &GenerationContext<'_>, group: &DeploymentGroup, out: &mut String) {
    let host = ctx.host_name(&group.host);
    let vm_id = ctx
        .vm_id(&group.host.id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let address = ctx.static_address(&group.host.id).unwrap_or("dhcp");

    out.push_str(&format!("### {}\n", host));
    out.push('\n');
    out.push_str(&format!("- VM id: {}\n", vm_id));
    out.push_str(&format!("- Address: {}\n", address));
    out.push_str(&format!("- Compose file: `{}`\n", compose_path(&host)));

    if !group.networks.is_empty() {
        let networks: Vec<String> = group
            .networks
            .iter()
            .map(|network| {
                let cidr = network
                    .config
                    .as_network()
                    .and_then(|c| c.cidr.as_deref())
                    .unwrap_or("no CIDR");
                format!("{} ({})", ctx.network_name(network), cidr)
            })
            .collect();
        out.push_str(&format!("- Networks: {}\n", networks.join(", ")));
    }

    out.push('\n');
    out.push_str("| Service | Type | Image |\n");
    out.push_str("|---------|------|-------|\n");
    for service in &group.services {
        let image = match &service.config {
            NodeConfig::Docker(docker) => docker.image.clone(),
            _ => None,
        }
        .or_else(|| {
            service
                .kind
                .service_kind()
                .map(|kind| kind.template().image.to_string())
        })
        .unwrap_or_default();
        out.push_str(&format!(
            "| {} | {} | `{}` |\n",
            ctx.service_name(service),
            service.kind,
            image,
        ));
    }
}
