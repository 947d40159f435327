//! Workspace directory management.
//!
//! Provides a consistent on-disk layout for a Vesta workspace, ensuring the
//! same paths are used by the execution engine and the snapshot store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory structure for a Vesta workspace.
///
/// All engine-managed files live under the workspace root:
///
/// ```text
/// workspace/
/// ├── data/       # Sandbox root for variable exports and csv reads
/// └── snapshots/  # Persisted session environments
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceDirs {
    /// The workspace root itself.
    pub root: PathBuf,

    /// Sandbox root for data files. Variable exports may never resolve
    /// outside this directory.
    pub data_dir: PathBuf,

    /// Snapshot directory for persisted session environments.
    pub snapshot_dir: PathBuf,
}

impl WorkspaceDirs {
    /// Create the directory structure under a workspace root.
    ///
    /// Creates all necessary directories if they don't exist.
    ///
    /// # Errors
    /// Returns an error if directory creation fails.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let data_dir = root.join("data");
        let snapshot_dir = root.join("snapshots");

        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&snapshot_dir)?;

        Ok(Self {
            root,
            data_dir,
            snapshot_dir,
        })
    }
}

/// Resolve a caller-supplied relative path against a sandbox root.
///
/// Rejects absolute paths and any `..` traversal that would escape the
/// root. The returned path is not required to exist.
pub fn resolve_sandboxed(root: &Path, relative: &str) -> Result<PathBuf> {
    use std::path::Component;

    let rel = Path::new(relative);
    if rel.is_absolute() {
        return Err(crate::error::Error::PathEscapesSandbox {
            path: rel.to_path_buf(),
        });
    }

    let mut depth = 0usize;
    let mut resolved = root.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(crate::error::Error::PathEscapesSandbox {
                        path: rel.to_path_buf(),
                    });
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(crate::error::Error::PathEscapesSandbox {
                    path: rel.to_path_buf(),
                });
            }
        }
    }

    Ok(resolved)
}
