//! Deferred follow-up actions attached to operation results.
//!
//! A finished run never touches the filesystem on its own. Instead its result
//! carries [`Capability`] values ("save the archive here", "export these
//! bytes", "show this folder") that the caller invokes explicitly through an
//! [`ActionHandler`].

use std::fs;
use std::path::{Path, PathBuf};

use strum::Display;
use thiserror::Error;

use crate::engine::Artifact;

/// The kind of follow-up action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    /// Write the produced archive at a destination path.
    #[strum(to_string = "Save")]
    Materialize,
    /// Hand the produced bytes to the user under a file name.
    #[strum(to_string = "Export")]
    Export,
    /// Show a location to the user.
    #[strum(to_string = "Reveal")]
    Reveal,
}

/// Errors while invoking a capability.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The engine produced no bytes for this action.
    #[error("{action}: no output was produced")]
    MissingArtifact { action: Action },

    /// I/O failure at a path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handler does not support this action.
    #[error("{action} is not supported here")]
    Unsupported { action: Action },
}

impl ActionError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A follow-up action on a result, invoked only on request.
#[derive(Debug, Clone)]
pub struct Capability {
    action: Action,
    target: PathBuf,
    artifact: Option<Artifact>,
}

impl Capability {
    /// Save `artifact` at `target`.
    pub fn materialize(target: impl Into<PathBuf>, artifact: Option<Artifact>) -> Self {
        Self {
            action: Action::Materialize,
            target: target.into(),
            artifact,
        }
    }

    /// Export `artifact` under `file_name`.
    pub fn export(file_name: impl Into<PathBuf>, artifact: Option<Artifact>) -> Self {
        Self {
            action: Action::Export,
            target: file_name.into(),
            artifact,
        }
    }

    /// Show `target` to the user.
    pub fn reveal(target: impl Into<PathBuf>) -> Self {
        Self {
            action: Action::Reveal,
            target: target.into(),
            artifact: None,
        }
    }

    /// The action kind.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Destination path, export file name, or revealed location.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Bytes the action would write, if any.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Perform the action through `handler`.
    pub fn invoke<H: ActionHandler + ?Sized>(&self, handler: &H) -> Result<(), ActionError> {
        match self.action {
            Action::Materialize => handler.materialize(&self.target, self.artifact.as_ref()),
            Action::Export => handler.export(&self.target, self.artifact.as_ref()),
            Action::Reveal => handler.reveal(&self.target),
        }
    }
}

/// Presentation-layer implementation of follow-up actions.
pub trait ActionHandler {
    /// Write `artifact` at `target`.
    fn materialize(&self, target: &Path, artifact: Option<&Artifact>) -> Result<(), ActionError>;

    /// Hand `artifact` to the user as `file_name`.
    fn export(&self, file_name: &Path, artifact: Option<&Artifact>) -> Result<(), ActionError>;

    /// Show `target` to the user.
    fn reveal(&self, target: &Path) -> Result<(), ActionError>;
}

/// Handler that writes artifacts to the local filesystem.
///
/// Exports land in `export_dir`; reveals only check that the location exists
/// and leave displaying it to the caller.
#[derive(Debug, Clone)]
pub struct FsActionHandler {
    export_dir: PathBuf,
}

impl FsActionHandler {
    /// Create a handler exporting into `export_dir`.
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    fn write(path: &Path, artifact: &Artifact) -> Result<(), ActionError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ActionError::io(parent, e))?;
        }
        fs::write(path, artifact.as_bytes()).map_err(|e| ActionError::io(path, e))?;
        tracing::info!(path = %path.display(), bytes = artifact.len(), "wrote artifact");
        Ok(())
    }
}

impl ActionHandler for FsActionHandler {
    fn materialize(&self, target: &Path, artifact: Option<&Artifact>) -> Result<(), ActionError> {
        let artifact = artifact.ok_or(ActionError::MissingArtifact {
            action: Action::Materialize,
        })?;
        Self::write(target, artifact)
    }

    fn export(&self, file_name: &Path, artifact: Option<&Artifact>) -> Result<(), ActionError> {
        let artifact = artifact.ok_or(ActionError::MissingArtifact {
            action: Action::Export,
        })?;
        let name = file_name.file_name().map(Path::new).unwrap_or(file_name);
        Self::write(&self.export_dir.join(name), artifact)
    }

    fn reveal(&self, target: &Path) -> Result<(), ActionError> {
        fs::metadata(target).map_err(|e| ActionError::io(target, e))?;
        tracing::info!(path = %target.display(), "reveal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_materialize_writes_artifact() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("backup.zip");
        let capability = Capability::materialize(&target, Some(Artifact::new(b"PK".to_vec())));

        capability.invoke(&FsActionHandler::new(dir.path())).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"PK");
    }

    #[test]
    fn test_export_uses_file_name_only() {
        let dir = TempDir::new().unwrap();
        let capability = Capability::export("../../escape.zip", Some(Artifact::new(vec![1, 2, 3])));

        capability.invoke(&FsActionHandler::new(dir.path())).unwrap();

        let written = fs::read(dir.path().join("escape.zip")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let capability = Capability::export("x.zip", None);
        let err = capability
            .invoke(&FsActionHandler::new(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::MissingArtifact {
                action: Action::Export
            }
        ));
    }

    #[test]
    fn test_reveal_requires_existing_path() {
        let dir = TempDir::new().unwrap();
        let handler = FsActionHandler::new(dir.path());

        assert!(Capability::reveal(dir.path()).invoke(&handler).is_ok());
        assert!(
            Capability::reveal(dir.path().join("missing"))
                .invoke(&handler)
                .is_err()
        );
    }
}
