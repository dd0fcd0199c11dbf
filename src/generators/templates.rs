//! Container templates per service type.
//!
//! Each service kind maps to a constant template. `config_dir` is where the
//! image reads its configuration; generated config files are mounted there
//! one file at a time so the image's own defaults stay in place.

use crate::graph::ServiceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTemplate {
    pub image: &'static str,
    pub restart: &'static str,
    pub ports: &'static [&'static str],
    pub config_dir: Option<&'static str>,
}

const DOCKER: ServiceTemplate = ServiceTemplate {
    image: "nginx:latest",
    restart: "unless-stopped",
    ports: &[],
    config_dir: None,
};

const DNS: ServiceTemplate = ServiceTemplate {
    image: "ubuntu/bind9:latest",
    restart: "unless-stopped",
    ports: &["53:53/tcp", "53:53/udp"],
    config_dir: Some("/etc/bind"),
};

const DHCP: ServiceTemplate = ServiceTemplate {
    image: "networkboot/dhcpd:latest",
    restart: "unless-stopped",
    ports: &["67:67/udp"],
    config_dir: Some("/data"),
};

const LOAD_BALANCER: ServiceTemplate = ServiceTemplate {
    image: "nginx:stable-alpine",
    restart: "unless-stopped",
    ports: &["80:80"],
    config_dir: Some("/etc/nginx"),
};

impl ServiceKind {
    pub fn template(&self) -> &'static ServiceTemplate {
        match self {
            ServiceKind::Docker => &DOCKER,
            ServiceKind::Dns => &DNS,
            ServiceKind::Dhcp => &DHCP,
            ServiceKind::LoadBalancer => &LOAD_BALANCER,
        }
    }
}

impl ServiceTemplate {
    /// Read-only bind mount of one generated config file into `config_dir`.
    ///
    /// `artifact_path` is relative to the bundle root, as is the compose
    /// stack's working directory on the host.
    pub fn config_mount(&self, artifact_path: &str) -> Option<String> {
        let dir = self.config_dir?;
        let file = artifact_path.rsplit('/').next().unwrap_or(artifact_path);
        Some(format!("./{}:{}/{}:ro", artifact_path, dir, file))
    }
}
