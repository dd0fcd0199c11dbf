//! Typed node configuration.
//!
//! Each node type has its own configuration struct. Decoding never fails: a
//! field that is missing or of the wrong shape takes its default, so an
//! incomplete graph still exports (incompleteness is reported by validation).

use super::types::NodeKind;
use crate::utils::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration of a node, tagged by node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
    Vm(VmConfig),
    Network(NetworkConfig),
    Docker(DockerConfig),
    Dns(DnsConfig),
    Dhcp(DhcpConfig),
    LoadBalancer(LoadBalancerConfig),
    /// Routers, switches, firewalls and unknown node types
    Device(DeviceConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub cpu: Option<u32>,
    /// Human formatted memory size, e.g. `"4GB"`
    #[serde(default, deserialize_with = "lenient::string")]
    pub memory: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub disk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub cidr: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub gateway: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub vlan: Option<u32>,
    /// Addresses on this segment are handed out by a DHCP server
    #[serde(default, deserialize_with = "lenient::flag")]
    pub dhcp: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub ports: Vec<String>,
    #[serde(default, deserialize_with = "lenient::environment")]
    pub environment: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub volumes: Vec<String>,
}

/// A single DNS resource record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,
    pub value: String,
}

fn default_record_type() -> String {
    "A".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    /// Zone served by this DNS server
    #[serde(default, deserialize_with = "lenient::string")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub records: Vec<DnsRecord>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub upstream: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub range_start: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub range_end: Option<String>,
    /// Lease time in seconds
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub lease_time: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub listen_port: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub algorithm: Option<String>,
    /// Upstream servers as `host:port`
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub backends: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
}

/// Operating system assumed when a VM does not name one
pub const DEFAULT_VM_OS: &str = "Ubuntu 22.04";
/// vCPU count assumed when a VM does not set one
pub const DEFAULT_VM_CPU: u32 = 2;
/// Memory size assumed when a VM does not set one
pub const DEFAULT_VM_MEMORY: &str = "2GB";

impl VmConfig {
    pub fn os_or_default(&self) -> &str {
        self.os.as_deref().unwrap_or(DEFAULT_VM_OS)
    }

    /// Configured vCPU count; zero counts as unset
    pub fn cpu_or_default(&self) -> u32 {
        self.cpu.filter(|cpu| *cpu > 0).unwrap_or(DEFAULT_VM_CPU)
    }

    pub fn memory_or_default(&self) -> &str {
        self.memory.as_deref().unwrap_or(DEFAULT_VM_MEMORY)
    }
}

impl NodeConfig {
    /// Decode the raw editor configuration for a node of the given type.
    pub fn decode(kind: &NodeKind, raw: &Map<String, Value>) -> Self {
        match kind {
            NodeKind::Vm => NodeConfig::Vm(decode_or_default(kind, raw)),
            NodeKind::NetworkSegment => NodeConfig::Network(decode_or_default(kind, raw)),
            NodeKind::Docker => NodeConfig::Docker(decode_or_default(kind, raw)),
            NodeKind::Dns => NodeConfig::Dns(decode_or_default(kind, raw)),
            NodeKind::Dhcp => NodeConfig::Dhcp(decode_or_default(kind, raw)),
            NodeKind::LoadBalancer => NodeConfig::LoadBalancer(decode_or_default(kind, raw)),
            NodeKind::Router | NodeKind::Switch | NodeKind::Firewall | NodeKind::Other(_) => {
                NodeConfig::Device(decode_or_default(kind, raw))
            }
        }
    }

    /// Configured display name, if any
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            NodeConfig::Vm(c) => &c.name,
            NodeConfig::Network(c) => &c.name,
            NodeConfig::Docker(c) => &c.name,
            NodeConfig::Dns(c) => &c.name,
            NodeConfig::Dhcp(c) => &c.name,
            NodeConfig::LoadBalancer(c) => &c.name,
            NodeConfig::Device(c) => &c.name,
        };
        name.as_deref()
    }

    pub fn as_vm(&self) -> Option<&VmConfig> {
        match self {
            NodeConfig::Vm(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkConfig> {
        match self {
            NodeConfig::Network(c) => Some(c),
            _ => None,
        }
    }
}

fn decode_or_default<T>(kind: &NodeKind, raw: &Map<String, Value>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match serde_json::from_value(Value::Object(raw.clone())) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring unreadable {} configuration: {}", kind, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(kind: &str, raw: Value) -> NodeConfig {
        let map = raw.as_object().cloned().unwrap_or_default();
        NodeConfig::decode(&NodeKind::from(kind), &map)
    }

    #[test]
    fn test_decode_network() {
        let config = decode(
            "network-segment",
            json!({"name": "lan", "cidr": "10.0.0.0/24", "gateway": "10.0.0.1", "vlan": "20", "dhcp": true}),
        );
        let network = config.as_network().unwrap();

        assert_eq!(network.cidr.as_deref(), Some("10.0.0.0/24"));
        assert_eq!(network.vlan, Some(20));
        assert!(network.dhcp);
        assert_eq!(config.name(), Some("lan"));
    }

    #[test]
    fn test_decode_dns_records_skips_bad_entries() {
        let config = decode(
            "dns",
            json!({
                "domain": "lab.local",
                "records": [
                    {"name": "www", "value": "10.0.0.20"},
                    {"name": "mail", "type": "CNAME", "value": "www"},
                    "garbage"
                ]
            }),
        );

        match config {
            NodeConfig::Dns(dns) => {
                assert_eq!(dns.records.len(), 2);
                assert_eq!(dns.records[0].record_type, "A");
                assert_eq!(dns.records[1].record_type, "CNAME");
            }
            other => panic!("Expected DNS config, got {:?}", other),
        }
    }

    #[test]
    fn test_device_types_share_config() {
        assert!(matches!(decode("router", json!({"name": "r1"})), NodeConfig::Device(_)));
        assert!(matches!(decode("unknown-thing", json!({})), NodeConfig::Device(_)));
    }

    #[test]
    fn test_vm_defaults_when_missing() {
        let vm = decode("vm", json!({})).as_vm().cloned().unwrap();
        assert_eq!(vm, VmConfig::default());
    }
}
