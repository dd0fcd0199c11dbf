//! Service deployment playbook.
//!
//! Prepares every VM for containers, then copies and starts each host's
//! compose stack on that host only. Service configs are copied only for
//! services that have generated config files.

use super::compose::compose_path;
use super::configs::config_files;
use super::playbook::{list, only_on, Play, Task};
use super::render::to_yaml;
use super::{Artifact, GenerateError, GenerationContext, REMOTE_ROOT};

pub const SERVICES_PLAYBOOK_PATH: &str = "ansible/deploy-services.yml";

/// Inventory group holding all provisioned VMs
pub const VM_GROUP: &str = "vms";

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    let mut play = Play::new("Deploy Range42 services", VM_GROUP)
        .gather_facts()
        .escalate()
        .var("range42_root", REMOTE_ROOT);

    play.tasks.push(
        Task::new("Update apt cache", "ansible.builtin.apt")
            .arg("update_cache", true)
            .arg("cache_valid_time", 3600u32),
    );
    play.tasks.push(
        Task::new("Install Docker", "ansible.builtin.apt")
            .arg("name", list(["docker.io", "docker-compose-plugin"]))
            .arg("state", "present"),
    );
    play.tasks.push(
        Task::new("Enable Docker", "ansible.builtin.systemd")
            .arg("name", "docker")
            .arg("enabled", true)
            .arg("state", "started"),
    );
    play.tasks.push(
        Task::new("Create Range42 directory", "ansible.builtin.file")
            .arg("path", "{{ range42_root }}")
            .arg("state", "directory")
            .arg("mode", "0755"),
    );

    for group in ctx.analysis.groups_with_services() {
        let host = ctx.host_name(&group.host);

        play.tasks.push(
            Task::new(format!("Copy compose file for {}", host), "ansible.builtin.copy")
                .arg("src", format!("{{{{ playbook_dir }}}}/../{}", compose_path(&host)))
                .arg("dest", "{{ range42_root }}/docker-compose.yml")
                .arg("mode", "0644")
                .when(only_on(&host)),
        );

        for service in &group.services {
            if config_files(ctx, service).is_empty() {
                continue;
            }
            let name = ctx.service_name(service);
            play.tasks.push(
                Task::new(format!("Copy {} configuration", name), "ansible.builtin.copy")
                    .arg("src", format!("{{{{ playbook_dir }}}}/../configs/{}/", name))
                    .arg("dest", format!("{{{{ range42_root }}}}/configs/{}/", name))
                    .when(only_on(&host)),
            );
        }

        play.tasks.push(
            Task::new(format!("Start services on {}", host), "ansible.builtin.command")
                .arg("cmd", "docker compose up -d")
                .arg("chdir", "{{ range42_root }}")
                .when(only_on(&host)),
        );
    }

    let body = to_yaml(&vec![play])?;
    Ok(vec![Artifact::new(SERVICES_PLAYBOOK_PATH, body)])
}
