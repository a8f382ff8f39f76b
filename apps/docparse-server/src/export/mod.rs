//! Result materialization
//!
//! Builds a [`PipeResult`] from an inference result and exports it as
//! markdown, a content list, or middle JSON. Every export is a pure
//! function of the pipe result, so repeated exports are identical.

mod content_list;
mod markdown;
mod middle_json;
mod pipe;

pub use pipe::{PipeBlock, PipePage, PipeResult, IMAGE_EXTENSION};

use crate::writer::WriterError;

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Image crop is not valid base64: {0}")]
    Image(#[source] base64::DecodeError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}
