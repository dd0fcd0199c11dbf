#[cfg(test)]
mod export_pipeline_tests {
    use chrono::{TimeZone, Utc};
    use range42::config::{Project, ProjectSettings, SettingsOverrides};
    use range42::config_loader::{load_project, resolve_settings};
    use range42::export::{deliver, export_project_at, export_topology_only_at, DirectorySink};
    use range42::graph::{Edge, Node};
    use range42::ip::{host_sequence, integer_to_ip, parse_cidr, HostSequenceOptions};
    use range42::topology::{generate_topology, AddressingMethod, PlanReason};
    use range42::analysis::analyze_infrastructure;
    use serde_json::{json, Value};
    use std::fs;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn network(id: &str, config: Value) -> Node {
        Node::new(id, "network-segment", config)
    }

    fn vm(id: &str, parent: &str) -> Node {
        Node::new(id, "vm", json!({"name": id})).with_parent(parent)
    }

    /// Network with three VMs, a container on the first VM and a DNS server nobody hosts
    fn office_project() -> Project {
        let nodes = vec![
            network(
                "net-office",
                json!({"name": "office", "cidr": "192.168.1.0/24", "gateway": "192.168.1.1"}),
            ),
            vm("vm-a", "net-office"),
            vm("vm-b", "net-office"),
            vm("vm-c", "net-office"),
            Node::new("web", "docker", json!({"name": "web", "image": "nginx:alpine", "ports": ["80:80"]})),
            Node::new("resolver", "dns", json!({"name": "resolver", "domain": "office.lan"})),
        ];
        let edges = vec![
            Edge::new("e1", "vm-a", "web"),
            Edge::new("e2", "net-office", "vm-a"),
        ];
        Project::new("Office", nodes, edges)
    }

    /// Subnet arithmetic for a /24 and the collapsed /31 and /32 blocks
    #[test]
    fn test_cidr_bounds() {
        let block = parse_cidr("192.168.1.0/24").unwrap();
        assert_eq!(integer_to_ip(block.network_address), "192.168.1.0");
        assert_eq!(integer_to_ip(block.broadcast_address), "192.168.1.255");
        assert_eq!(integer_to_ip(block.first_usable_address), "192.168.1.1");
        assert_eq!(integer_to_ip(block.last_usable_address), "192.168.1.254");

        for cidr in ["10.0.0.6/31", "10.0.0.7/32"] {
            let block = parse_cidr(cidr).unwrap();
            assert_eq!(block.first_usable_address, block.network_address);
            assert_eq!(block.last_usable_address, block.network_address);
        }
    }

    /// The host sequence can be consumed partially and resumed
    #[test]
    fn test_host_sequence_is_lazy() {
        let block = parse_cidr("10.1.0.0/24").unwrap();
        let mut sequence = host_sequence(&block, HostSequenceOptions::default());

        let first: Vec<String> = sequence.by_ref().take(2).map(integer_to_ip).collect();
        assert_eq!(first, vec!["10.1.0.1", "10.1.0.2"]);
        assert_eq!(sequence.next().map(integer_to_ip).as_deref(), Some("10.1.0.3"));
    }

    /// Static allocation starts at .10 and follows member order
    #[test]
    fn test_static_allocation_in_member_order() {
        let project = office_project();
        let topology = generate_topology(&project.nodes, &project.edges);
        let plan = &topology.network("net-office").unwrap().ip_plan;

        assert_eq!(plan.method, AddressingMethod::Static);
        assert_eq!(plan.reason, PlanReason::NoDhcpDetected);
        assert_eq!(plan.allocations["vm-a"], "192.168.1.10");
        assert_eq!(plan.allocations["vm-b"], "192.168.1.11");
        assert_eq!(plan.allocations["vm-c"], "192.168.1.12");

        let host = topology.host("vm-b").unwrap();
        assert_eq!(host.network_interfaces.len(), 1);
        assert_eq!(host.static_address(), Some("192.168.1.11"));
    }

    /// A network flagged for DHCP gets no static allocations
    #[test]
    fn test_dhcp_flag_without_dhcp_server() {
        let nodes = vec![
            network("net", json!({"cidr": "10.0.0.0/24", "dhcp": true})),
            vm("vm-1", "net"),
        ];
        let topology = generate_topology(&nodes, &[]);
        let plan = &topology.networks[0].ip_plan;

        assert_eq!(plan.method, AddressingMethod::Dhcp);
        assert!(plan.allocations.is_empty());
        assert_eq!(topology.hosts[0].network_interfaces[0].address, None);
    }

    /// A service without a VM dependency is listed but never deployed
    #[test]
    fn test_unhosted_service_is_not_grouped() {
        let project = office_project();
        let topology = generate_topology(&project.nodes, &project.edges);
        let analysis = analyze_infrastructure(&project.nodes, &project.edges);

        assert!(topology.services.iter().any(|s| s.id == "resolver"));
        assert!(analysis
            .deployment_groups
            .values()
            .all(|group| group.services.iter().all(|s| s.id != "resolver")));
        assert_eq!(analysis.unassigned_services, vec!["resolver".to_string()]);
    }

    /// An empty graph produces an empty but well-formed document
    #[test]
    fn test_empty_graph() {
        let topology = generate_topology(&[], &[]);
        let json: Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();

        assert_eq!(json["version"], json!(1));
        assert_eq!(json["summary"]["nodeCount"], json!(0));
        assert_eq!(json["summary"]["edgeCount"], json!(0));
        assert_eq!(json["nodes"], json!([]));
        assert_eq!(json["networks"], json!([]));
        assert_eq!(json["hosts"], json!([]));
        assert_eq!(json["services"], json!([]));
        assert_eq!(json["rules"][0]["id"], json!("net-001"));

        let bundle = export_project_at(&Project::default(), &ProjectSettings::default(), Utc::now()).unwrap();
        assert!(bundle.get("topology.json").is_some());
        assert!(bundle.metadata.generator_failures.is_empty());
    }

    /// Identical input yields byte-identical topology JSON and bundles
    #[test]
    fn test_exports_are_deterministic() {
        let project = office_project();
        let first = generate_topology(&project.nodes, &project.edges).to_json().unwrap();
        let second = generate_topology(&project.nodes, &project.edges).to_json().unwrap();
        assert_eq!(first, second);

        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let settings = ProjectSettings::default();
        assert_eq!(
            export_project_at(&project, &settings, at).unwrap().artifacts,
            export_project_at(&project, &settings, at).unwrap().artifacts
        );
    }

    /// The input graph is left untouched by an export
    #[test]
    fn test_export_does_not_mutate_input() {
        let project = office_project();
        let before = project.clone();
        let _ = export_project_at(&project, &ProjectSettings::default(), Utc::now()).unwrap();
        assert_eq!(project, before);
    }

    /// Load a project file, export it and write the bundle to disk
    #[test]
    fn test_project_file_to_directory() {
        let mut file = NamedTempFile::new().unwrap();
        let project_json = serde_json::to_string(&office_project()).unwrap();
        write!(file, "{}", project_json).unwrap();

        let project = load_project(file.path()).unwrap();
        let overrides = SettingsOverrides {
            base_url: None,
            default_node: Some("pve-lab".to_string()),
        };
        let settings = resolve_settings(&project, &overrides).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let bundle = export_project_at(&project, &settings, at).unwrap();

        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("bundle"));
        deliver(&bundle, &mut sink).unwrap();

        let root = dir.path().join("bundle");
        for path in bundle.paths() {
            assert!(root.join(path).is_file(), "missing {}", path);
        }

        let compose = fs::read_to_string(root.join("docker-compose/vm-a.yml")).unwrap();
        assert!(compose.contains("    image: nginx:alpine\n"));
        assert!(compose.contains("        - subnet: 192.168.1.0/24\n"));

        let inventory = fs::read_to_string(root.join("ansible/inventory.yml")).unwrap();
        assert!(inventory.contains("proxmox_node: pve-lab"));
        assert!(inventory.contains("ansible_host: 192.168.1.12"));

        let zone = fs::read_to_string(root.join("configs/resolver/db.office.lan")).unwrap();
        assert!(zone.contains("vm-a\tIN\tA\t192.168.1.10"));

        let metadata: Value = serde_json::from_str(&fs::read_to_string(root.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(metadata["projectName"], json!("Office"));
        assert_eq!(metadata["exportedAt"], json!("2025-01-01T00:00:00.000Z"));
        assert_eq!(metadata["unassignedServices"], json!(["resolver"]));
        assert_eq!(metadata["hostCount"], json!(3));
    }

    /// Topology-only exports carry nothing but the topology and metadata
    #[test]
    fn test_topology_only_bundle() {
        let project = office_project();
        let bundle = export_topology_only_at(&project, &ProjectSettings::default(), Utc::now()).unwrap();

        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["metadata.json", "topology.json"]);

        let topology: Value = serde_json::from_str(bundle.get("topology.json").unwrap()).unwrap();
        assert_eq!(topology["networks"][0]["ipPlan"]["allocations"]["vm-a"], json!("192.168.1.10"));
    }
}
