/// Workspace Manager - per-attempt scratch files
///
/// Every compile-and-run attempt gets its own source/artifact pair whose
/// names are unique across concurrent requests (millisecond timestamp plus a
/// random UUID). Files are removed when the `Workspace` is released or
/// dropped, whichever comes first, and never twice.
use crate::error::{EngineError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const SOURCE_EXTENSION: &str = "cpp";
const ARTIFACT_EXTENSION: &str = "bin";

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| EngineError::Workspace {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh, collision-free workspace. No files exist yet.
    pub fn acquire(&self) -> Workspace {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let id = format!("submission_{}_{}", millis, uuid::Uuid::new_v4().simple());

        let workspace = Workspace {
            source_path: self.root.join(format!("{}.{}", id, SOURCE_EXTENSION)),
            artifact_path: self.root.join(format!("{}.{}", id, ARTIFACT_EXTENSION)),
            id,
            released: false,
        };
        debug!(workspace = %workspace.id, "Workspace acquired");
        workspace
    }

    /// Delete the workspace's files. Equivalent to dropping it, but reports
    /// removal errors instead of only logging them.
    pub fn release(&self, mut workspace: Workspace) -> io::Result<()> {
        workspace.cleanup()
    }
}

/// Source and artifact paths owned by exactly one in-flight attempt
#[derive(Debug)]
pub struct Workspace {
    id: String,
    source_path: PathBuf,
    artifact_path: PathBuf,
    released: bool,
}

impl Workspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub async fn write_source(&self, source: &str) -> Result<()> {
        tokio::fs::write(&self.source_path, source)
            .await
            .map_err(|source| EngineError::Workspace {
                path: self.source_path.clone(),
                source,
            })
    }

    fn cleanup(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut first_error = None;
        for path in [&self.source_path, &self.artifact_path] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(workspace = %self.id, path = %path.display(), error = %e, "Failed to remove workspace file");
                    first_error.get_or_insert(e);
                }
            }
        }
        debug!(workspace = %self.id, "Workspace released");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Errors are already logged inside cleanup
        let _ = self.cleanup();
    }
}
