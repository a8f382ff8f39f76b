//! Dataset types
//!
//! Format tags, analysis modes, and the closed set of analyzable datasets.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::Location;

pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const OFFICE_EXTENSIONS: &[&str] = &["ppt", "pptx", "doc", "docx"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Document family, decided from the extension alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Office,
    Image,
}

impl DocumentKind {
    /// Detect kind from file extension (case-insensitive, leading dot optional)
    pub fn from_extension(ext: &str) -> Result<Self, DatasetError> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if PDF_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Pdf)
        } else if OFFICE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Office)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Image)
        } else {
            Err(DatasetError::UnsupportedFormat(ext))
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::Office => "office",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}

/// Requested analysis mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    #[default]
    Auto,
    Ocr,
    Txt,
}

impl FromStr for ParseMethod {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "ocr" => Ok(Self::Ocr),
            "txt" => Ok(Self::Txt),
            other => Err(DatasetError::UnknownMethod(other.to_string())),
        }
    }
}

/// Concrete mode, fixed once resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedMode {
    Ocr,
    Txt,
}

impl ResolvedMode {
    pub fn is_ocr(self) -> bool {
        matches!(self, Self::Ocr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for ResolvedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input bytes with their type tag
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    /// Extension without the leading dot
    pub extension: String,
    /// Where the bytes came from; `None` for uploads
    pub source: Option<Location>,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Location) -> Self {
        self.source = Some(source);
        self
    }
}

/// A PDF loaded directly from bytes
#[derive(Debug, Clone)]
pub struct PdfDataset {
    pub(crate) bytes: Arc<[u8]>,
}

impl PdfDataset {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DatasetError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(DatasetError::InvalidDocument(
                "content is not a PDF document".to_string(),
            ));
        }
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// An office document after conversion to PDF
#[derive(Debug, Clone)]
pub struct OfficeDataset {
    pdf: PdfDataset,
    source_extension: String,
}

impl OfficeDataset {
    pub fn new(converted_pdf: Vec<u8>, source_extension: impl Into<String>) -> Result<Self, DatasetError> {
        let pdf = PdfDataset::from_bytes(converted_pdf).map_err(|_| {
            DatasetError::ConversionFailed("converter produced a non-PDF document".to_string())
        })?;
        Ok(Self {
            pdf,
            source_extension: source_extension.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.pdf.bytes()
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }
}

/// A single raster image
#[derive(Debug, Clone)]
pub struct ImageDataset {
    bytes: Arc<[u8]>,
    extension: String,
    width: u32,
    height: u32,
}

impl ImageDataset {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            bytes: Arc::from(bytes),
            extension: extension.into(),
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The analyzable document for one request.
///
/// Adding a format means adding a variant here; capabilities such as
/// text-layer classification are checked per variant.
#[derive(Debug)]
pub enum TypedDataset {
    Pdf(PdfDataset),
    Office(OfficeDataset),
    Image(ImageDataset),
}

impl TypedDataset {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Pdf(_) => DocumentKind::Pdf,
            Self::Office(_) => DocumentKind::Office,
            Self::Image(_) => DocumentKind::Image,
        }
    }

    /// Payload handed to the inference collaborator
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Pdf(pdf) => pdf.bytes(),
            Self::Office(office) => office.bytes(),
            Self::Image(image) => image.bytes(),
        }
    }

    /// Whether an explicit mode can be honored for this variant
    pub fn supports(&self, mode: ResolvedMode) -> bool {
        match self {
            Self::Pdf(_) | Self::Office(_) => true,
            Self::Image(_) => mode == ResolvedMode::Ocr,
        }
    }

    /// The PDF whose text layer decides `auto` mode. Office documents are
    /// classified on their converted PDF.
    pub fn as_classifiable(&self) -> Option<&PdfDataset> {
        match self {
            Self::Pdf(pdf) => Some(pdf),
            Self::Office(office) => Some(&office.pdf),
            Self::Image(_) => None,
        }
    }
}

/// Loader and classifier errors
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown parse method: {0}")]
    UnknownMethod(String),

    #[error("Parse method {mode} is not supported for {kind} documents")]
    UnsupportedMode { mode: ResolvedMode, kind: DocumentKind },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Office conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Staging failed: {0}")]
    Staging(#[from] std::io::Error),
}
