//! Backend selection and whole-object I/O

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::StorageError;

use super::credentials::CredentialResolver;
use super::location::Location;
use super::s3_client::S3Client;

/// A concrete durable backend
#[derive(Clone)]
pub enum Backend {
    /// Local filesystem; paths are filesystem paths
    Local,
    /// One S3 bucket; paths are object keys
    S3(S3Client),
}

impl Backend {
    /// Read a whole object
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Backend::Local => tokio::fs::read(path).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
                ErrorKind::PermissionDenied => StorageError::AccessDenied(path.to_string()),
                _ => StorageError::Transport(format!("{}: {}", path, e)),
            }),
            Backend::S3(client) => client.get_object(path).await,
        }
    }

    /// Write a whole object, replacing whatever is stored at `path`.
    ///
    /// Concurrent writers to one path resolve last-writer-wins.
    pub async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        match self {
            Backend::Local => write_local(Path::new(path), data).await,
            Backend::S3(client) => {
                let content_type = mime_guess::from_path(path).first_or_octet_stream();
                client
                    .put_object(path, data.to_vec(), content_type.essence_str())
                    .await
            }
        }
    }

    /// List object paths stored directly under `prefix`
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        match self {
            Backend::Local => list_local(Path::new(prefix)).await,
            Backend::S3(client) => {
                let prefix = format!("{}/", prefix.trim_end_matches('/'));
                let keys = client.list_keys(&prefix).await?;
                Ok(keys
                    .into_iter()
                    .filter(|key| !key[prefix.len()..].contains('/'))
                    .collect())
            }
        }
    }

    /// Join a relative name onto a prefix in this backend's addressing scheme
    pub fn join(&self, prefix: &str, name: &str) -> String {
        let name = name.trim_start_matches('/');
        match self {
            Backend::Local => Path::new(prefix).join(name).to_string_lossy().to_string(),
            Backend::S3(_) => {
                let prefix = prefix.trim_matches('/');
                if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", prefix, name)
                }
            }
        }
    }

    /// Make sure a directory exists. Object storage has no directories.
    pub async fn ensure_dir(&self, path: &str) -> Result<(), StorageError> {
        match self {
            Backend::Local => tokio::fs::create_dir_all(path).await.map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => StorageError::PermissionDenied(path.to_string()),
                _ => StorageError::Transport(format!("{}: {}", path, e)),
            }),
            Backend::S3(_) => Ok(()),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::S3(_))
    }
}

async fn write_local(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let display = path.display().to_string();
    let map_err = |e: std::io::Error| match e.kind() {
        ErrorKind::PermissionDenied => StorageError::PermissionDenied(display.clone()),
        _ => StorageError::Transport(format!("{}: {}", display, e)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(map_err)?;
    }

    // Write beside the target and rename over it so readers never see a torn file
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path: PathBuf = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    tokio::fs::write(&temp_path, data).await.map_err(map_err)?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(map_err(e));
    }

    Ok(())
}

async fn list_local(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::Transport(format!("{}: {}", dir.display(), e))),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if is_file && !hidden {
            paths.push(entry.path().to_string_lossy().to_string());
        }
    }

    Ok(paths)
}

/// Uniform read/write over local and remote locations.
///
/// Remote locations resolve credentials per request through the injected
/// resolver; nothing is cached between requests.
#[derive(Clone)]
pub struct Storage {
    resolver: Arc<dyn CredentialResolver>,
}

impl Storage {
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { resolver }
    }

    /// Pick the backend that serves `location`
    pub fn backend_for(&self, location: &Location) -> Result<Backend, StorageError> {
        match location {
            Location::Local(_) => Ok(Backend::Local),
            Location::Remote { bucket, .. } => {
                let credentials = self.resolver.resolve(bucket)?;
                tracing::debug!(bucket = %bucket, endpoint = %credentials.endpoint, "Resolved bucket credentials");
                Ok(Backend::S3(S3Client::new(bucket, &credentials)))
            }
        }
    }

    pub async fn read(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        self.backend_for(location)?.read(&location.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ConfigCredentialResolver;
    use tempfile::TempDir;

    fn local_storage() -> Storage {
        Storage::new(Arc::new(ConfigCredentialResolver::default()))
    }

    #[tokio::test]
    async fn test_local_round_trip_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out/nested/doc.md");
        let location = Location::Local(target.clone());

        Backend::Local
            .write(&location.path(), b"# Title")
            .await
            .unwrap();

        assert_eq!(local_storage().read(&location).await.unwrap(), b"# Title");
    }

    #[tokio::test]
    async fn test_local_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let location = Location::Local(temp_dir.path().join("doc.md"));

        let backend = Backend::Local;
        backend.write(&location.path(), b"first").await.unwrap();
        backend.write(&location.path(), b"second").await.unwrap();

        assert_eq!(local_storage().read(&location).await.unwrap(), b"second");
        // No temp files left behind
        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_local_read_missing() {
        let temp_dir = TempDir::new().unwrap();
        let location = Location::Local(temp_dir.path().join("missing.pdf"));

        let result = local_storage().read(&location).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remote_without_credentials() {
        let location = Location::parse("s3://papers/a.pdf").unwrap();

        let result = local_storage().read(&location).await;
        assert!(matches!(result, Err(StorageError::ConfigNotFound(bucket)) if bucket == "papers"));
    }

    #[tokio::test]
    async fn test_local_list_skips_dirs_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        std::fs::create_dir_all(images.join("nested")).unwrap();
        std::fs::write(images.join("a.jpg"), b"a").unwrap();
        std::fs::write(images.join("b.jpg"), b"b").unwrap();

        let backend = Backend::Local;
        let mut listed = backend.list(&images.to_string_lossy()).await.unwrap();
        listed.sort();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].ends_with("a.jpg"));

        let missing = backend
            .list(&temp_dir.path().join("nope").to_string_lossy())
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_join() {
        assert_eq!(Backend::Local.join("output/doc", "doc.md"), "output/doc/doc.md");

        let client = S3Client::new(
            "papers",
            &crate::storage::S3Credentials {
                access_key: "ak".to_string(),
                secret_key: "sk".to_string(),
                endpoint: "http://localhost:9000".to_string(),
                region: None,
            },
        );
        let backend = Backend::S3(client);
        assert_eq!(backend.join("output/doc/", "/images/a.jpg"), "output/doc/images/a.jpg");
        assert_eq!(backend.join("", "a.jpg"), "a.jpg");
    }
}
