//! Service configuration files.
//!
//! - DNS servers with a valid `domain`: a BIND zone file plus
//!   `named.conf.local` (and `named.conf.options` when upstream resolvers are
//!   set). VMs with a static address get an A record unless the zone already
//!   names them.
//! - Load balancers with `backends`: an nginx reverse-proxy `nginx.conf`.
//! - DHCP servers with a full range: `dhcpd.conf` for the parent network, or
//!   the /24 around the range when there is no usable parent network.
//!
//! Services missing the fields they need get no config files. The service
//! playbook and the compose files ask [`config_files`] which files exist.

use super::{Artifact, GenerateError, GenerationContext};
use crate::graph::{DhcpConfig, DnsConfig, LoadBalancerConfig, Node, NodeConfig};
use crate::ip::{ip_to_integer, parse_cidr, CidrBlock};
use log::debug;

const ZONE_TTL: u32 = 86400;
const ZONE_SERIAL: u32 = 1;
const DEFAULT_LEASE_TIME: u32 = 86400;
const MAX_LABEL_LEN: usize = 63;

pub fn generate(ctx: &GenerationContext<'_>) -> Result<Vec<Artifact>, GenerateError> {
    let mut artifacts = Vec::new();

    for service in &ctx.analysis.services {
        let generated = config_files(ctx, service);
        if generated.is_empty() && !matches!(service.config, NodeConfig::Docker(_)) {
            debug!("No config files for {} {}: required fields missing", service.kind, service.id);
        }
        artifacts.extend(generated);
    }

    Ok(artifacts)
}

/// Config files generated for one service, empty when it needs none or lacks
/// the fields to build them.
pub fn config_files(ctx: &GenerationContext<'_>, service: &Node) -> Vec<Artifact> {
    let name = ctx.service_name(service);
    match &service.config {
        NodeConfig::Dns(dns) => dns_configs(ctx, service, &name, dns),
        NodeConfig::LoadBalancer(lb) => nginx_config(&name, lb).into_iter().collect(),
        NodeConfig::Dhcp(dhcp) => dhcp_config(ctx, service, &name, dhcp).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Whether `domain` is a plain DNS name usable in a zone and a file name
fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LEN
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

fn config_path(service_name: &str, file: &str) -> String {
    format!("configs/{}/{}", service_name, file)
}

fn dns_configs(ctx: &GenerationContext<'_>, service: &Node, name: &str, dns: &DnsConfig) -> Vec<Artifact> {
    let Some(domain) = dns.domain.as_deref().map(|d| d.trim().trim_end_matches('.')) else {
        return Vec::new();
    };
    if !is_valid_domain(domain) {
        debug!("Skipping DNS config for {}: invalid domain {:?}", service.id, domain);
        return Vec::new();
    }

    let ns_address = ctx
        .analysis
        .host_of_service(&service.id)
        .and_then(|host_id| ctx.static_address(host_id))
        .unwrap_or("127.0.0.1");

    let mut zone = String::new();
    zone.push_str(&format!("; Zone file for {}\n", domain));
    zone.push_str(&format!("$TTL {}\n", ZONE_TTL));
    zone.push_str(&format!("@\tIN\tSOA\tns1.{}. admin.{}. (\n", domain, domain));
    zone.push_str(&format!("\t\t{}\t; serial\n", ZONE_SERIAL));
    zone.push_str("\t\t3600\t; refresh\n");
    zone.push_str("\t\t1800\t; retry\n");
    zone.push_str("\t\t604800\t; expire\n");
    zone.push_str(&format!("\t\t{} )\t; minimum\n", ZONE_TTL));
    zone.push('\n');
    zone.push_str(&format!("@\tIN\tNS\tns1.{}.\n", domain));
    zone.push_str(&format!("ns1\tIN\tA\t{}\n", ns_address));

    let mut named: Vec<String> = vec!["ns1".to_string()];
    for record in &dns.records {
        zone.push_str(&format!(
            "{}\tIN\t{}\t{}\n",
            record.name,
            record.record_type.to_ascii_uppercase(),
            record.value,
        ));
        named.push(record.name.to_ascii_lowercase());
    }

    for spec in ctx.host_specs() {
        let Some(address) = &spec.address else { continue };
        if named.contains(&spec.name) {
            continue;
        }
        zone.push_str(&format!("{}\tIN\tA\t{}\n", spec.name, address));
        named.push(spec.name);
    }

    let zone_file = format!("db.{}", domain);
    let mut local = String::new();
    local.push_str(&format!("zone \"{}\" {{\n", domain));
    local.push_str("    type master;\n");
    local.push_str(&format!("    file \"/etc/bind/{}\";\n", zone_file));
    local.push_str("};\n");

    let mut artifacts = vec![
        Artifact::new(config_path(name, &zone_file), zone),
        Artifact::new(config_path(name, "named.conf.local"), local),
    ];

    if !dns.upstream.is_empty() {
        let mut options = String::new();
        options.push_str("options {\n");
        options.push_str("    directory \"/var/cache/bind\";\n");
        options.push_str("    recursion yes;\n");
        options.push_str("    forwarders {\n");
        for upstream in &dns.upstream {
            options.push_str(&format!("        {};\n", upstream));
        }
        options.push_str("    };\n");
        options.push_str("};\n");
        artifacts.push(Artifact::new(config_path(name, "named.conf.options"), options));
    }

    artifacts
}

/// nginx upstream directive for a balancing algorithm; round robin has none
fn balancing_directive(algorithm: Option<&str>) -> Option<&'static str> {
    let normalized = algorithm?.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    match normalized.as_str() {
        "least_conn" | "leastconn" | "least_connections" => Some("least_conn"),
        "ip_hash" | "iphash" | "source" => Some("ip_hash"),
        _ => None,
    }
}

fn nginx_config(name: &str, lb: &LoadBalancerConfig) -> Option<Artifact> {
    if lb.backends.is_empty() {
        return None;
    }

    let upstream = format!("{}_backend", name.replace('-', "_"));
    let mut conf = String::new();
    conf.push_str("events {}\n");
    conf.push('\n');
    conf.push_str("http {\n");
    conf.push_str(&format!("    upstream {} {{\n", upstream));
    if let Some(directive) = balancing_directive(lb.algorithm.as_deref()) {
        conf.push_str(&format!("        {};\n", directive));
    }
    for backend in &lb.backends {
        conf.push_str(&format!("        server {};\n", backend));
    }
    conf.push_str("    }\n");
    conf.push('\n');
    conf.push_str("    server {\n");
    conf.push_str("        listen 80;\n");
    conf.push_str("        location / {\n");
    conf.push_str(&format!("            proxy_pass http://{};\n", upstream));
    conf.push_str("            proxy_set_header Host $host;\n");
    conf.push_str("            proxy_set_header X-Real-IP $remote_addr;\n");
    conf.push_str("        }\n");
    conf.push_str("    }\n");
    conf.push_str("}\n");

    Some(Artifact::new(config_path(name, "nginx.conf"), conf))
}

fn dhcp_config(ctx: &GenerationContext<'_>, service: &Node, name: &str, dhcp: &DhcpConfig) -> Option<Artifact> {
    let (start, end) = (dhcp.range_start.as_deref()?, dhcp.range_end.as_deref()?);

    let parent = service
        .parent
        .as_deref()
        .and_then(|id| ctx.analysis.networks.iter().find(|n| n.id == id))
        .and_then(|network| network.config.as_network());

    let parent_block = parent.and_then(|n| n.cidr.as_deref()).and_then(parse_cidr);
    let (block, gateway): (CidrBlock, Option<&str>) = match parent_block {
        Some(block) => {
            let gateway = parent
                .and_then(|n| n.gateway.as_deref())
                .filter(|gw| block.contains_usable(ip_to_integer(gw)));
            (block, gateway)
        }
        None => (parse_cidr(&format!("{}/24", start))?, None),
    };

    let lease = dhcp.lease_time.filter(|t| *t > 0).unwrap_or(DEFAULT_LEASE_TIME);

    let mut conf = String::new();
    conf.push_str(&format!("default-lease-time {};\n", lease));
    conf.push_str(&format!("max-lease-time {};\n", u64::from(lease) * 2));
    conf.push_str("authoritative;\n");
    conf.push('\n');
    conf.push_str(&format!("subnet {} netmask {} {{\n", block.network(), block.netmask()));
    conf.push_str(&format!("    range {} {};\n", start, end));
    if let Some(gateway) = gateway {
        conf.push_str(&format!("    option routers {};\n", gateway));
    }
    conf.push_str(&format!("    option broadcast-address {};\n", block.broadcast()));
    conf.push_str("}\n");

    Some(Artifact::new(config_path(name, "dhcpd.conf"), conf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::*;
    use crate::graph::Edge;
    use serde_json::json;

    fn find<'a>(artifacts: &'a [Artifact], path: &str) -> &'a str {
        artifacts
            .iter()
            .find(|a| a.path == path)
            .map(|a| a.content.as_str())
            .unwrap_or_else(|| panic!("missing artifact {}", path))
    }

    #[test]
    fn test_dns_zone_with_auto_records() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let artifacts = generate(&fixture.context()).unwrap();

        let zone = find(&artifacts, "configs/ns/db.lab.local");
        assert!(zone.contains("@\tIN\tSOA\tns1.lab.local. admin.lab.local. ("));
        assert!(zone.contains("\t\t1\t; serial"));
        assert!(zone.contains("ns1\tIN\tA\t192.168.10.10\n"));
        assert!(zone.contains("www\tIN\tA\t192.168.10.10\n"));
        assert!(zone.contains("web-server\tIN\tA\t192.168.10.10\n"));
        assert!(zone.contains("db\tIN\tA\t192.168.10.11\n"));

        let local = find(&artifacts, "configs/ns/named.conf.local");
        assert!(local.contains("zone \"lab.local\" {"));
        assert!(local.contains("file \"/etc/bind/db.lab.local\";"));
        assert!(!artifacts.iter().any(|a| a.path.ends_with("named.conf.options")));
    }

    #[test]
    fn test_dns_without_domain_is_skipped() {
        let nodes = vec![Node::new("dns", "dns", json!({"upstream": "1.1.1.1"}))];
        let fixture = Fixture::new(&nodes, &[]);
        assert!(generate(&fixture.context()).unwrap().is_empty());
    }

    #[test]
    fn test_nginx_config() {
        let nodes = vec![Node::new(
            "lb-1",
            "loadbalancer",
            json!({"name": "edge-lb", "algorithm": "least-connections", "backends": "10.0.0.5:80, 10.0.0.6:80"}),
        )];
        let fixture = Fixture::new(&nodes, &[]);
        let artifacts = generate(&fixture.context()).unwrap();

        let conf = find(&artifacts, "configs/edge-lb/nginx.conf");
        assert!(conf.contains("    upstream edge_lb_backend {\n        least_conn;\n"));
        assert!(conf.contains("        server 10.0.0.5:80;\n        server 10.0.0.6:80;\n"));
        assert!(conf.contains("proxy_pass http://edge_lb_backend;"));
    }

    #[test]
    fn test_balancing_directive() {
        assert_eq!(balancing_directive(Some("ip-hash")), Some("ip_hash"));
        assert_eq!(balancing_directive(Some("round-robin")), None);
        assert_eq!(balancing_directive(None), None);
    }

    #[test]
    fn test_dhcpd_uses_parent_network() {
        let nodes = vec![
            Node::new(
                "net",
                "network-segment",
                json!({"cidr": "10.20.0.0/16", "gateway": "10.20.0.1"}),
            ),
            Node::new(
                "dhcp",
                "dhcp",
                json!({"rangeStart": "10.20.1.100", "rangeEnd": "10.20.1.200", "leaseTime": 3600}),
            )
            .with_parent("net"),
        ];
        let fixture = Fixture::new(&nodes, &[Edge::new("e", "net", "dhcp")]);
        let artifacts = generate(&fixture.context()).unwrap();

        let conf = find(&artifacts, "configs/dhcp/dhcpd.conf");
        assert!(conf.starts_with("default-lease-time 3600;\nmax-lease-time 7200;\n"));
        assert!(conf.contains("subnet 10.20.0.0 netmask 255.255.0.0 {"));
        assert!(conf.contains("    range 10.20.1.100 10.20.1.200;"));
        assert!(conf.contains("    option routers 10.20.0.1;"));
    }

    #[test]
    fn test_dhcpd_falls_back_to_range_subnet() {
        let nodes = vec![Node::new(
            "dhcp",
            "dhcp",
            json!({"rangeStart": "172.16.5.50", "rangeEnd": "172.16.5.99"}),
        )];
        let fixture = Fixture::new(&nodes, &[]);
        let artifacts = generate(&fixture.context()).unwrap();

        let conf = find(&artifacts, "configs/dhcp/dhcpd.conf");
        assert!(conf.contains("subnet 172.16.5.0 netmask 255.255.255.0 {"));
        assert!(conf.contains("default-lease-time 86400;"));
        assert!(!conf.contains("option routers"));
    }

    #[test]
    fn test_dhcp_without_range_is_skipped() {
        let nodes = vec![Node::new("dhcp", "dhcp", json!({"rangeStart": "10.0.0.10"}))];
        let fixture = Fixture::new(&nodes, &[]);
        assert!(generate(&fixture.context()).unwrap().is_empty());
    }

    #[test]
    fn test_dns_with_path_like_domain_is_skipped() {
        let nodes = vec![
            Node::new("ns", "dns", json!({"domain": "x/../../../escape"})),
            Node::new("ns-2", "dns", json!({"domain": "lab..local"})),
        ];
        let fixture = Fixture::new(&nodes, &[]);
        assert!(generate(&fixture.context()).unwrap().is_empty());
    }

    #[test]
    fn test_domain_names() {
        assert!(is_valid_domain("lab.local"));
        assert!(is_valid_domain("corp-1.example_zone"));
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("x/../escape"));
        assert!(!is_valid_domain("two words.local"));
        assert!(!is_valid_domain(&"a".repeat(64)));
    }

    #[test]
    fn test_trailing_dot_is_dropped_from_domain() {
        let nodes = vec![Node::new("ns", "dns", json!({"domain": "lab.local."}))];
        let fixture = Fixture::new(&nodes, &[]);
        let artifacts = generate(&fixture.context()).unwrap();

        let zone = find(&artifacts, "configs/ns/db.lab.local");
        assert!(zone.contains("@\tIN\tNS\tns1.lab.local.\n"));
    }

    #[test]
    fn test_config_files_per_service() {
        let (nodes, edges) = web_lab();
        let fixture = Fixture::new(&nodes, &edges);
        let ctx = fixture.context();

        let ns = nodes.iter().find(|n| n.id == "dns-1").unwrap();
        let paths: Vec<_> = config_files(&ctx, ns).into_iter().map(|a| a.path).collect();
        assert_eq!(paths, vec!["configs/ns/db.lab.local", "configs/ns/named.conf.local"]);

        let frontend = nodes.iter().find(|n| n.id == "app-1").unwrap();
        assert!(config_files(&ctx, frontend).is_empty());
    }
}
