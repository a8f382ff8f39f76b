//! Durable writer over a storage backend

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage::Backend;

use super::{Writer, WriterError};

/// Writes outputs under a fixed prefix of a durable backend
#[derive(Clone)]
pub struct StorageWriter {
    backend: Backend,
    prefix: String,
}

impl StorageWriter {
    pub fn new(backend: Backend, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full backend path for a relative name
    fn path_of(&self, name: &str) -> String {
        self.backend.join(&self.prefix, name)
    }

    /// Names (relative to the prefix) of the objects written under it
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let paths = self.backend.list(&self.prefix).await?;
        Ok(paths
            .into_iter()
            .filter_map(|path| {
                path.rsplit(['/', '\\'])
                    .next()
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }

    /// Read back an object by relative name
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.backend.read(&self.path_of(name)).await
    }
}

#[async_trait]
impl Writer for StorageWriter {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), WriterError> {
        self.backend.write(&self.path_of(path), data).await?;
        Ok(())
    }
}
