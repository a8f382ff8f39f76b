//! Document datasets
//!
//! Loading raw input into typed datasets, staging for formats that need a
//! filesystem hand-off, and analysis-mode resolution.

mod classify;
mod loader;
mod office;
mod staging;
mod types;

pub use classify::{classify_text, resolve_mode, MIN_TEXT_CHARS};
pub use loader::{DocumentLoader, LoadedDocument};
pub use office::{office_files_in, LibreOfficeConverter, OfficeConverter};
pub use staging::StagedDir;
pub use types::*;
