//! Office document conversion
//!
//! Office files are converted to PDF before analysis. Conversion is an
//! external collaborator; the default implementation shells out to
//! LibreOffice.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{DatasetError, OFFICE_EXTENSIONS};

/// Converts the office documents found in a staged directory
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    /// Convert every office document in `staged_dir`, returning the produced
    /// documents in a stable order.
    async fn convert(&self, staged_dir: &Path) -> Result<Vec<PathBuf>, DatasetError>;
}

/// Converter backed by a headless LibreOffice
pub struct LibreOfficeConverter {
    soffice_bin: String,
}

impl LibreOfficeConverter {
    pub fn new(soffice_bin: impl Into<String>) -> Self {
        Self {
            soffice_bin: soffice_bin.into(),
        }
    }
}

#[async_trait]
impl OfficeConverter for LibreOfficeConverter {
    async fn convert(&self, staged_dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let out_dir = staged_dir.join("converted");
        tokio::fs::create_dir_all(&out_dir).await?;

        let mut produced = Vec::new();
        for source in office_files_in(staged_dir).await? {
            let output = Command::new(&self.soffice_bin)
                .arg("--headless")
                .arg("--convert-to")
                .arg("pdf")
                .arg("--outdir")
                .arg(&out_dir)
                .arg(&source)
                .output()
                .await
                .map_err(|e| {
                    DatasetError::ConversionFailed(format!(
                        "failed to run {}: {}",
                        self.soffice_bin, e
                    ))
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DatasetError::ConversionFailed(format!(
                    "{} exited with {}: {}",
                    self.soffice_bin,
                    output.status,
                    stderr.trim()
                )));
            }

            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let pdf = out_dir.join(format!("{}.pdf", stem));
            if tokio::fs::try_exists(&pdf).await.unwrap_or(false) {
                produced.push(pdf);
            } else {
                tracing::warn!(source = %source.display(), "Converter reported success but produced no PDF");
            }
        }

        Ok(produced)
    }
}

/// Office documents directly inside `dir`, sorted by name
pub async fn office_files_in(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_office = path
            .extension()
            .map(|ext| {
                OFFICE_EXTENSIONS.contains(&ext.to_string_lossy().to_ascii_lowercase().as_str())
            })
            .unwrap_or(false);
        if is_office && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
