//! Request-scoped staging directories

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory owned by one request.
///
/// Removed by [`close`](StagedDir::close) on the normal path and by `Drop`
/// on every other path.
#[derive(Debug)]
pub struct StagedDir {
    dir: TempDir,
}

impl StagedDir {
    /// Create a fresh directory under `root`
    pub fn create(root: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("docparse-").tempdir_in(root)?;
        tracing::debug!(path = %dir.path().display(), "Created staging directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `data` to `name` inside the directory
    pub async fn write_file(&self, name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Remove the directory and everything in it
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed staging directory"),
            Err(e) => tracing::warn!(path = %path.display(), "Failed to remove staging directory: {}", e),
        }
    }
}
