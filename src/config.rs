//! Project and settings configuration.
//!
//! A project file is the editor's export: the node and edge lists plus
//! optional project metadata and Proxmox settings. Settings are normally
//! stored by the editor per project; here they arrive with the project file
//! and can be overridden from the command line.

use crate::graph::{Edge, Node};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Base URL used when none is configured or the configured one is unusable
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Proxmox node used when none is configured
pub const DEFAULT_PROXMOX_NODE: &str = "px-testing";
/// Project name used when the project file does not carry one
pub const DEFAULT_PROJECT_NAME: &str = "project";

/// Editor project: graph snapshot plus metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ProjectSettings>,
}

impl Project {
    pub fn new(name: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Project {
            id: None,
            name: Some(name.into()),
            nodes,
            edges,
            settings: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME)
    }
}

/// Current project settings: where the Range42 API lives and which Proxmox
/// node VMs are created on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    pub base_url: String,
    pub default_node: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_node: DEFAULT_PROXMOX_NODE.to_string(),
        }
    }
}

/// Errors raised when settings are explicitly provided but unusable
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
    #[error("Invalid Proxmox node name '{0}': expected letters, digits and inner dashes")]
    InvalidNode(String),
}

/// Command-line values that take precedence over project file settings
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub default_node: Option<String>,
}

impl ProjectSettings {
    /// Return a copy with the base URL normalized and an unusable node name
    /// replaced by the default.
    pub fn normalized(&self) -> Self {
        let node = self.default_node.trim();
        let default_node = if is_valid_node_name(node) {
            node.to_string()
        } else {
            if !node.is_empty() {
                log::warn!(
                    "Ignoring invalid Proxmox node name {:?}; using {}",
                    node,
                    DEFAULT_PROXMOX_NODE
                );
            }
            DEFAULT_PROXMOX_NODE.to_string()
        };

        ProjectSettings {
            base_url: normalize_base_url(&self.base_url, DEFAULT_BASE_URL),
            default_node,
        }
    }

    /// Apply overrides, rejecting values that would silently fall back to defaults.
    pub fn with_overrides(&self, overrides: &SettingsOverrides) -> Result<Self, SettingsError> {
        let mut settings = self.clone();

        if let Some(base_url) = &overrides.base_url {
            if !has_http_scheme(base_url.trim()) {
                return Err(SettingsError::InvalidBaseUrl(base_url.clone()));
            }
            settings.base_url = base_url.clone();
        }

        if let Some(node) = &overrides.default_node {
            if !is_valid_node_name(node.trim()) {
                return Err(SettingsError::InvalidNode(node.clone()));
            }
            settings.default_node = node.clone();
        }

        Ok(settings.normalized())
    }
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

fn http_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://").expect("Invalid http scheme regex"))
}

fn node_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("Invalid node name regex")
    })
}

fn has_http_scheme(url: &str) -> bool {
    http_scheme().is_match(url)
}

/// Whether `node` is a usable Proxmox node name (a single hostname label).
pub fn is_valid_node_name(node: &str) -> bool {
    node_name().is_match(node)
}

/// Normalize a Range42 API base URL.
///
/// The URL is trimmed, any API path from `/v0/` on is dropped, whitespace and
/// trailing slashes are removed. A URL without an `http(s)://` scheme falls
/// back to `fallback`.
///
/// # Examples
/// ```
/// use range42::config::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url(" https://api.lab:8000/v0/admin/run/ ", "http://fallback"),
///     "https://api.lab:8000"
/// );
/// assert_eq!(normalize_base_url("ftp://nope", "http://fallback"), "http://fallback");
/// ```
pub fn normalize_base_url(base_url: &str, fallback: &str) -> String {
    let mut normalized = base_url.trim().to_string();
    if normalized.is_empty() {
        return fallback.to_string();
    }

    if let Some(index) = normalized.find("/v0/") {
        normalized.truncate(index);
    }

    normalized = whitespace().replace_all(&normalized, "").into_owned();
    let normalized = normalized.trim_end_matches('/');

    if normalized.is_empty() || !has_http_scheme(normalized) {
        return fallback.to_string();
    }

    normalized.to_string()
}
