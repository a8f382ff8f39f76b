//! Output writers
//!
//! A [`Writer`] persists or buffers named outputs. Two variants exist:
//! [`StorageWriter`] writes through a durable backend under a prefix, and
//! [`MemoryWriter`] accumulates text so an export can be returned inline
//! without a durable round trip.

mod durable;
mod memory;

use async_trait::async_trait;

pub use durable::StorageWriter;
pub use memory::{MemoryWriter, MemoryWriters};

use crate::error::StorageError;

/// Writer errors
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Binary content routed into a text buffer
    #[error("Output for {path} is not valid UTF-8: {source}")]
    Decode {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Writer used after close")]
    Closed,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Capability to persist or buffer a named output
#[async_trait]
pub trait Writer: Send + Sync {
    /// Write raw bytes under `path`
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), WriterError>;

    /// Write text under `path`
    async fn write_string(&self, path: &str, data: &str) -> Result<(), WriterError> {
        self.write(path, data.as_bytes()).await
    }
}
