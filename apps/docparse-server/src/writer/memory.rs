//! In-memory writer

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Writer, WriterError};

/// Accumulates text in memory, ignoring the path argument.
///
/// Only text may be written: bytes that are not valid UTF-8 fail with
/// [`WriterError::Decode`]. The buffer must be released with [`close`]
/// once the value has been taken.
///
/// [`close`]: MemoryWriter::close
#[derive(Debug)]
pub struct MemoryWriter {
    buffer: Mutex<Option<String>>,
}

impl Default for MemoryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Some(String::new())),
        }
    }

    /// Everything written so far
    pub fn get_value(&self) -> Result<String, WriterError> {
        self.buffer.lock().clone().ok_or(WriterError::Closed)
    }

    /// Release the buffer. Idempotent.
    pub fn close(&self) {
        self.buffer.lock().take();
    }

    fn append(&self, data: &str) -> Result<(), WriterError> {
        let mut guard = self.buffer.lock();
        let buffer = guard.as_mut().ok_or(WriterError::Closed)?;
        buffer.push_str(data);
        Ok(())
    }
}

#[async_trait]
impl Writer for MemoryWriter {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), WriterError> {
        let text = std::str::from_utf8(data).map_err(|source| WriterError::Decode {
            path: path.to_string(),
            source,
        })?;
        self.append(text)
    }

    async fn write_string(&self, _path: &str, data: &str) -> Result<(), WriterError> {
        self.append(data)
    }
}

/// A set of named memory writers released together.
///
/// Closing happens on [`close_all`](MemoryWriters::close_all) and again on
/// drop, so an early return cannot leak a buffer.
#[derive(Debug, Default)]
pub struct MemoryWriters {
    writers: Vec<(&'static str, MemoryWriter)>,
}

impl MemoryWriters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer registered under `name`, created on first use
    pub fn get(&mut self, name: &'static str) -> &MemoryWriter {
        let index = match self.writers.iter().position(|(n, _)| *n == name) {
            Some(index) => index,
            None => {
                self.writers.push((name, MemoryWriter::new()));
                self.writers.len() - 1
            }
        };
        &self.writers[index].1
    }

    /// Close every buffer
    pub fn close_all(&self) {
        for (_, writer) in &self.writers {
            writer.close();
        }
    }
}

impl Drop for MemoryWriters {
    fn drop(&mut self) {
        self.close_all();
    }
}
