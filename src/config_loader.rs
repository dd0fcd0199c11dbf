use crate::config::{Project, ProjectSettings, SettingsOverrides};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Load a project file exported by the editor.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else as JSON.
pub fn load_project(project_path: &Path) -> Result<Project> {
    info!("Loading project from: {:?}", project_path);

    let content = fs::read_to_string(project_path)
        .wrap_err_with(|| format!("Failed to read project file {:?}", project_path))?;

    let project = parse_project(&content, is_yaml(project_path))
        .wrap_err_with(|| format!("Failed to parse project file {:?}", project_path))?;

    info!(
        "Loaded project '{}' with {} nodes and {} edges",
        project.name(),
        project.nodes.len(),
        project.edges.len()
    );

    if project.nodes.is_empty() {
        warn!("Project contains no nodes; the export will be empty");
    }

    Ok(project)
}

/// Parse project content as YAML or JSON.
pub fn parse_project(content: &str, yaml: bool) -> Result<Project> {
    let project = if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    Ok(project)
}

/// Resolve the settings for an export: project file settings, then CLI overrides.
pub fn resolve_settings(project: &Project, overrides: &SettingsOverrides) -> Result<ProjectSettings> {
    let base = project.settings.clone().unwrap_or_default();
    let settings = base
        .with_overrides(overrides)
        .wrap_err("Invalid settings override")?;

    info!(
        "Using Range42 API at {} with Proxmox node '{}'",
        settings.base_url, settings.default_node
    );
    Ok(settings)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_project() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"name: Lab
nodes:
  - id: net
    type: network-segment
    data:
      config:
        cidr: 10.0.0.0/24
edges: []
settings:
  baseUrl: "http://10.1.1.1:8000/v0/"
  defaultNode: pve"#
        )
        .unwrap();

        let project = load_project(file.path()).unwrap();
        assert_eq!(project.name(), "Lab");
        assert_eq!(project.nodes.len(), 1);

        let settings = resolve_settings(&project, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.base_url, "http://10.1.1.1:8000");
        assert_eq!(settings.default_node, "pve");
    }

    #[test]
    fn test_load_json_project() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"nodes": [{{"id": "vm-1", "type": "vm"}}], "edges": []}}"#).unwrap();

        let project = load_project(file.path()).unwrap();
        assert_eq!(project.nodes[0].id, "vm-1");
        assert!(project.settings.is_none());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        assert!(load_project(Path::new("/nonexistent/project.json")).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(load_project(file.path()).is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let project = parse_project(
            r#"{"nodes": [], "edges": [], "settings": {"baseUrl": "http://a", "defaultNode": "a"}}"#,
            false,
        )
        .unwrap();
        let overrides = SettingsOverrides {
            base_url: None,
            default_node: Some("b".to_string()),
        };

        let settings = resolve_settings(&project, &overrides).unwrap();
        assert_eq!(settings.base_url, "http://a");
        assert_eq!(settings.default_node, "b");
    }
}
