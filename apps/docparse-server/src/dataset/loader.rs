//! Document loading
//!
//! Turns raw bytes and an extension into a [`TypedDataset`]. Formats that
//! need a filesystem hand-off (office conversion, image decoding) are staged
//! in a request-scoped directory that the caller releases once analysis is
//! over.

use std::path::PathBuf;
use std::sync::Arc;

use super::office::OfficeConverter;
use super::staging::StagedDir;
use super::types::{
    DatasetError, DocumentKind, ImageDataset, OfficeDataset, PdfDataset, RawDocument, TypedDataset,
};

/// A loaded dataset plus the staging directory that must outlive analysis
#[derive(Debug)]
pub struct LoadedDocument {
    pub dataset: TypedDataset,
    pub staged: Option<StagedDir>,
}

/// Classifies raw documents and loads them into datasets
#[derive(Clone)]
pub struct DocumentLoader {
    staging_root: PathBuf,
    converter: Arc<dyn OfficeConverter>,
}

impl DocumentLoader {
    pub fn new(staging_root: impl Into<PathBuf>, converter: Arc<dyn OfficeConverter>) -> Self {
        Self {
            staging_root: staging_root.into(),
            converter,
        }
    }

    /// Load `raw` into the dataset variant matching its extension.
    ///
    /// Unsupported extensions are rejected before anything is staged.
    pub async fn load(&self, raw: RawDocument) -> Result<LoadedDocument, DatasetError> {
        let kind = DocumentKind::from_extension(&raw.extension)?;
        let extension = raw.extension.trim_start_matches('.').to_ascii_lowercase();

        let source = raw
            .source
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "upload".to_string());
        tracing::debug!(kind = %kind, size = raw.bytes.len(), source = %source, "Loading document");

        match kind {
            DocumentKind::Pdf => Ok(LoadedDocument {
                dataset: TypedDataset::Pdf(PdfDataset::from_bytes(raw.bytes)?),
                staged: None,
            }),
            DocumentKind::Office => {
                let staged = StagedDir::create(&self.staging_root)?;
                staged
                    .write_file(&format!("source.{}", extension), &raw.bytes)
                    .await?;

                let converted = self.converter.convert(staged.path()).await?;
                let first = converted.into_iter().next().ok_or_else(|| {
                    DatasetError::ConversionFailed("no document was produced".to_string())
                })?;
                let pdf = tokio::fs::read(&first).await?;

                Ok(LoadedDocument {
                    dataset: TypedDataset::Office(OfficeDataset::new(pdf, extension)?),
                    staged: Some(staged),
                })
            }
            DocumentKind::Image => {
                let staged = StagedDir::create(&self.staging_root)?;
                let path = staged
                    .write_file(&format!("source.{}", extension), &raw.bytes)
                    .await?;

                let dims_path = path.clone();
                let (width, height) =
                    tokio::task::spawn_blocking(move || image::image_dimensions(&dims_path))
                        .await
                        .map_err(|e| DatasetError::InvalidDocument(format!("image decoding aborted: {}", e)))?
                        .map_err(|e| DatasetError::InvalidDocument(format!("undecodable image: {}", e)))?;
                let bytes = tokio::fs::read(&path).await?;

                Ok(LoadedDocument {
                    dataset: TypedDataset::Image(ImageDataset::new(bytes, extension, width, height)),
                    staged: Some(staged),
                })
            }
        }
    }
}
