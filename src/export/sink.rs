//! Bundle delivery.
//!
//! Packaging a bundle (zip, upload, ...) is up to the caller. `DirectorySink`
//! is the packaging used by the command line: every artifact becomes a file
//! under a root directory.

use super::bundle::ExportBundle;
use log::{debug, info};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Artifact path '{0}' escapes the bundle root")]
    UnsafePath(String),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Receiver of a finished export bundle.
pub trait BundleSink {
    /// Deliver the bundle. Called once per export; failures are not retried.
    fn deliver(&mut self, bundle: &ExportBundle) -> Result<(), SinkError>;
}

/// Writes a bundle into a directory tree.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySink { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target(&self, artifact_path: &str) -> Result<PathBuf, SinkError> {
        let relative = Path::new(artifact_path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || artifact_path.is_empty() {
            return Err(SinkError::UnsafePath(artifact_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BundleSink for DirectorySink {
    /// Every target path is checked before the first file is written, so a
    /// rejected bundle leaves the root untouched.
    fn deliver(&mut self, bundle: &ExportBundle) -> Result<(), SinkError> {
        let targets = bundle
            .artifacts
            .iter()
            .map(|(artifact_path, content)| Ok((artifact_path, self.target(artifact_path)?, content)))
            .collect::<Result<Vec<_>, SinkError>>()?;

        for (artifact_path, path, content) in targets {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            fs::write(&path, content).map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;

            if artifact_path.ends_with(".sh") {
                make_executable(&path)?;
            }
            debug!("Wrote {:?}", path);
        }

        info!("Wrote {} artifacts to {:?}", bundle.len(), self.root);
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SinkError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SinkError> {
    Ok(())
}
