//! Shell helpers: `scripts/deploy.sh` and `scripts/cleanup.sh`.

use super::inventory::INVENTORY_PATH;
use super::provision::PROVISION_PLAYBOOK_PATH;
use super::services::{SERVICES_PLAYBOOK_PATH, VM_GROUP};
use super::{comment_text, Artifact, GenerateError, GenerationContext, REMOTE_ROOT};

pub const DEPLOY_SCRIPT_PATH: &str = "scripts/deploy.sh";
pub const CLEANUP_SCRIPT_PATH: &str = "scripts/cleanup.sh";

const PREAMBLE: &str = "set -euo pipefail\n\ncd \"$(dirname \"$0\")/..\"\n";

/// Single-quote `value` for bash; embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    Ok(vec![
        Artifact::new(DEPLOY_SCRIPT_PATH, deploy_script(ctx)),
        Artifact::new(CLEANUP_SCRIPT_PATH, cleanup_script(ctx)),
    ])
}

fn deploy_script(ctx: &GenerationContext<'_>) -> String {
    let mut script = String::new();
    script.push_str("#!/usr/bin/env bash\n");
    script.push_str(&format!("# Deploy {}\n", comment_text(ctx.project_name)));
    script.push_str(PREAMBLE);
    script.push('\n');
    script.push_str(&format!("DEFAULT_NODE={}\n", shell_quote(&ctx.settings.default_node)));
    script.push_str("echo \"Provisioning virtual machines on ${DEFAULT_NODE}\"\n");
    script.push_str(&format!(
        "ansible-playbook -i {} {} \"$@\"\n",
        INVENTORY_PATH, PROVISION_PLAYBOOK_PATH
    ));
    script.push('\n');
    script.push_str("echo \"Deploying services\"\n");
    script.push_str(&format!(
        "ansible-playbook -i {} {} \"$@\"\n",
        INVENTORY_PATH, SERVICES_PLAYBOOK_PATH
    ));
    script
}

fn cleanup_script(ctx: &GenerationContext<'_>) -> String {
    let service_hosts: Vec<String> = ctx
        .analysis
        .groups_with_services()
        .map(|group| ctx.host_name(&group.host))
        .collect();
    let vm_ids: Vec<String> = ctx.vm_ids().iter().map(u32::to_string).collect();

    let mut script = String::new();
    script.push_str("#!/usr/bin/env bash\n");
    script.push_str(&format!("# Tear down {}\n", comment_text(ctx.project_name)));
    script.push_str(PREAMBLE);
    script.push('\n');
    script.push_str(&format!("DEFAULT_NODE={}\n", shell_quote(&ctx.settings.default_node)));
    script.push_str("PROXMOX_HOST=\"${PROXMOX_HOST:-${DEFAULT_NODE}}\"\n");
    script.push_str(&format!("VM_IDS=({})\n", vm_ids.join(" ")));

    if !service_hosts.is_empty() {
        script.push('\n');
        script.push_str("echo \"Stopping service stacks\"\n");
        script.push_str(&format!(
            "ansible {} -i {} --become --limit {} -m ansible.builtin.shell -a \"cd {} && docker compose down\" || true\n",
            VM_GROUP,
            INVENTORY_PATH,
            shell_quote(&service_hosts.join(",")),
            REMOTE_ROOT
        ));
    }

    script.push('\n');
    script.push_str("for vmid in \"${VM_IDS[@]}\"; do\n");
    script.push_str("    echo \"Destroying VM ${vmid} on ${PROXMOX_HOST}\"\n");
    script.push_str("    ssh \"root@${PROXMOX_HOST}\" \"qm stop ${vmid} || true; qm destroy ${vmid} --purge\"\n");
    script.push_str("done\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::*;

    #[test]
    fn test_deploy_script_runs_both_playbooks() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();
        let deploy = &artifacts[0].content;

        assert_eq!(artifacts[0].path, "scripts/deploy.sh");
        assert!(deploy.starts_with("#!/usr/bin/env bash\n"));
        let provision = deploy.find("ansible/proxmox-provision.yml").unwrap();
        let services = deploy.find("ansible/deploy-services.yml").unwrap();
        assert!(provision < services);
    }

    #[test]
    fn test_cleanup_script() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();
        let cleanup = &artifacts[1].content;

        assert_eq!(artifacts[1].path, "scripts/cleanup.sh");
        assert!(cleanup.contains("DEFAULT_NODE='px-testing'\nPROXMOX_HOST=\"${PROXMOX_HOST:-${DEFAULT_NODE}}\"\n"));
        assert!(cleanup.contains("VM_IDS=(100 101)\n"));
        assert!(cleanup.contains("--limit 'web-server'"));
        assert!(cleanup.contains("qm destroy ${vmid} --purge"));
    }

    #[test]
    fn test_cleanup_without_services_skips_compose() {
        let fixture = Fixture::new(&[], &[]);
        let artifacts = generate(&fixture.context()).unwrap();

        assert!(!artifacts[1].content.contains("docker compose down"));
        assert!(artifacts[1].content.contains("VM_IDS=()\n"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("px-testing"), "'px-testing'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote("$(reboot)"), "'$(reboot)'");
    }

    #[test]
    fn test_project_values_cannot_inject_commands() {
        let (nodes, edges) = web_lab();
        let mut fixture = Fixture::new(&nodes, &edges);
        fixture.project_name = "Lab\ntouch /tmp/pwned".to_string();
        fixture.settings.default_node = "pve\"; rm -rf ~; echo \"".to_string();
        let artifacts = generate(&fixture.context()).unwrap();

        for artifact in &artifacts {
            let script = &artifact.content;
            assert!(!script.lines().any(|line| line.starts_with("touch ")));
            assert!(script.contains(" Lab touch /tmp/pwned\n"));
            assert!(script.contains("DEFAULT_NODE='pve\"; rm -rf ~; echo \"'\n"));
            assert!(!script.contains("${PROXMOX_HOST:-pve"));
        }
    }
}
