//! Docker Compose files, one per host with services.
//!
//! Each associated network becomes a bridge network (with an IPAM subnet
//! when its CIDR parses). A host without networks gets a single default
//! bridge. Services join the first declared network only. Generated config
//! files are mounted read-only, one file per volume.

use super::configs::config_files;
use super::render::render_yaml;
use super::{comment_text, Artifact, GenerateError, GenerationContext};
use crate::analysis::DeploymentGroup;
use crate::graph::{NodeConfig, Node};
use crate::ip::{ip_to_integer, parse_cidr};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Network used when a host has no associated network segment
pub const DEFAULT_NETWORK: &str = "range42_default";

/// Path of the compose file for a host slug
pub fn compose_path(host_name: &str) -> String {
    format!("docker-compose/{}.yml", host_name)
}

#[derive(Debug, Serialize)]
struct ComposeService {
    image: String,
    container_name: String,
    restart: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    environment: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    networks: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ComposeNetwork {
    driver: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipam: Option<Ipam>,
}

#[derive(Debug, Serialize)]
struct Ipam {
    config: Vec<IpamConfig>,
}

#[derive(Debug, Serialize)]
struct IpamConfig {
    subnet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway: Option<String>,
}

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    ctx.analysis
        .groups_with_services()
        .map(|group| compose_file(ctx, group))
        .collect()
}

fn compose_file(ctx: &GenerationContext<'_>, group: &DeploymentGroup) -> Result<Artifact, GenerateError> {
    let host_name = ctx.host_name(&group.host);

    let mut networks = Mapping::new();
    for network in &group.networks {
        networks.insert(
            Value::from(ctx.network_name(network)),
            serde_yaml::to_value(compose_network(network))?,
        );
    }
    if networks.is_empty() {
        networks.insert(
            Value::from(DEFAULT_NETWORK),
            serde_yaml::to_value(ComposeNetwork { driver: "bridge", ipam: None })?,
        );
    }

    let first_network = networks
        .keys()
        .next()
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_NETWORK)
        .to_string();

    let mut services = Mapping::new();
    for service in &group.services {
        let name = ctx.service_name(service);
        if let Some(block) = compose_service(ctx, &name, service, &first_network) {
            services.insert(Value::from(name), serde_yaml::to_value(block)?);
        }
    }

    let mut document = Mapping::new();
    document.insert(Value::from("services"), Value::Mapping(services));
    document.insert(Value::from("networks"), Value::Mapping(networks));

    let header = format!(
        "# Services for host {} ({})\n",
        host_name,
        comment_text(ctx.project_name)
    );
    Ok(Artifact::new(
        compose_path(&host_name),
        header + &render_yaml(&Value::Mapping(document)),
    ))
}

fn compose_service(
    ctx: &GenerationContext<'_>,
    name: &str,
    service: &Node,
    network: &str,
) -> Option<ComposeService> {
    let template = service.kind.service_kind()?.template();
    let volumes = config_files(ctx, service)
        .iter()
        .filter_map(|artifact| template.config_mount(&artifact.path))
        .collect();

    let mut block = ComposeService {
        image: template.image.to_string(),
        container_name: name.to_string(),
        restart: template.restart.to_string(),
        ports: template.ports.iter().map(|p| p.to_string()).collect(),
        environment: Vec::new(),
        volumes,
        networks: vec![network.to_string()],
    };

    match &service.config {
        NodeConfig::Docker(docker) => {
            if let Some(image) = &docker.image {
                block.image = image.clone();
            }
            if !docker.ports.is_empty() {
                block.ports = docker.ports.clone();
            }
            block.environment = docker.environment.clone();
            block.volumes.extend(docker.volumes.iter().cloned());
        }
        NodeConfig::LoadBalancer(lb) => {
            if let Some(port) = lb.listen_port {
                block.ports = vec![format!("{}:80", port)];
            }
        }
        _ => {}
    }

    Some(block)
}

fn compose_network(network: &Node) -> ComposeNetwork {
    let config = network.config.as_network();
    let block = config
        .and_then(|c| c.cidr.as_deref())
        .and_then(parse_cidr);

    let ipam = block.map(|block| {
        let gateway = config
            .and_then(|c| c.gateway.as_deref())
            .filter(|gw| block.contains_usable(ip_to_integer(gw)))
            .map(str::to_string);
        Ipam {
            config: vec![IpamConfig {
                subnet: block.to_string(),
                gateway,
            }],
        }
    });

    ComposeNetwork { driver: "bridge", ipam }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::*;
    use crate::graph::Edge;
    use serde_json::json;

    #[test]
    fn test_compose_for_web_lab() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, "docker-compose/web-server.yml");

        let expected = "\
# Services for host web-server (Test Lab)
services:
  frontend:
    image: nginx:1.25
    container_name: frontend
    restart: unless-stopped
    ports:
      - \"8080:80\"
    networks:
      - lan
  ns:
    image: ubuntu/bind9:latest
    container_name: ns
    restart: unless-stopped
    ports:
      - 53:53/tcp
      - 53:53/udp
    volumes:
      - ./configs/ns/db.lab.local:/etc/bind/db.lab.local:ro
      - ./configs/ns/named.conf.local:/etc/bind/named.conf.local:ro
    networks:
      - lan
networks:
  lan:
    driver: bridge
    ipam:
      config:
        - subnet: 192.168.10.0/24
          gateway: 192.168.10.1
";
        assert_eq!(artifacts[0].content, expected);
    }

    #[test]
    fn test_default_network_and_hosts_without_services() {
        let nodes = vec![
            Node::new("vm-a", "vm", json!({"name": "edge"})),
            Node::new("vm-b", "vm", json!({"name": "idle"})),
            Node::new("lb", "loadbalancer", json!({"listenPort": 8443, "backends": ["10.0.0.5:80"]})),
        ];
        let edges = vec![Edge::new("e1", "vm-a", "lb")];
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();

        assert_eq!(artifacts.len(), 1);
        let content = &artifacts[0].content;
        assert!(content.contains("  range42_default:\n    driver: bridge\n"));
        assert!(content.contains("      - \"8443:80\"\n"));
        assert!(content.contains("      - ./configs/lb/nginx.conf:/etc/nginx/nginx.conf:ro\n"));
    }

    #[test]
    fn test_no_volumes_without_config_files() {
        let nodes = vec![
            Node::new("vm-a", "vm", json!({"name": "edge"})),
            Node::new("dns", "dns", json!({"name": "ns"})),
            Node::new("lb", "loadbalancer", json!({"name": "lb"})),
        ];
        let edges = vec![Edge::new("e1", "vm-a", "dns"), Edge::new("e2", "vm-a", "lb")];
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();

        assert_eq!(artifacts.len(), 1);
        let content = &artifacts[0].content;
        assert!(content.contains("  ns:\n    image: ubuntu/bind9:latest\n"));
        assert!(content.contains("  lb:\n    image: nginx:stable-alpine\n"));
        assert!(!content.contains("volumes:"));
    }

    #[test]
    fn test_project_name_stays_on_header_line() {
        let (nodes, edges) = web_lab();
        let mut fixture = Fixture::new(&nodes, &edges);
        fixture.project_name = "Lab\nservices: {}".to_string();
        let artifacts = generate(&fixture.context()).unwrap();

        assert!(artifacts[0]
            .content
            .starts_with("# Services for host web-server (Lab services: {})\nservices:\n"));
    }
}
