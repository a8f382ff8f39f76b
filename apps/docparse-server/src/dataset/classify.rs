//! Mode resolution
//!
//! A PDF with a usable text layer is analyzed in text mode; anything that
//! needs its glyphs recognized from pixels goes through OCR.

use super::types::{DatasetError, ParseMethod, PdfDataset, ResolvedMode, TypedDataset};

/// Fewer meaningful characters than this and the document counts as scanned
pub const MIN_TEXT_CHARS: usize = 8;

/// Share of U+FFFD above which extracted text is considered garbled
const MAX_REPLACEMENT_RATIO: f64 = 0.1;

impl PdfDataset {
    /// Decide whether the PDF carries extractable text or needs OCR.
    ///
    /// Extraction runs on the blocking pool; an extractor error or panic is
    /// treated as "no usable text layer".
    pub async fn classify(&self) -> ResolvedMode {
        let bytes = self.bytes.clone();
        let extracted =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes[..]))
                .await;

        match extracted {
            Ok(Ok(text)) => classify_text(&text),
            Ok(Err(e)) => {
                tracing::debug!("Text layer extraction failed, classifying as scanned: {}", e);
                ResolvedMode::Ocr
            }
            Err(e) => {
                tracing::warn!("Text layer extraction aborted, classifying as scanned: {}", e);
                ResolvedMode::Ocr
            }
        }
    }
}

/// Classify extracted text-layer content
pub fn classify_text(text: &str) -> ResolvedMode {
    let meaningful: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if meaningful.len() < MIN_TEXT_CHARS {
        return ResolvedMode::Ocr;
    }

    let replacements = meaningful.iter().filter(|&&c| c == '\u{fffd}').count();
    if replacements as f64 / meaningful.len() as f64 > MAX_REPLACEMENT_RATIO {
        return ResolvedMode::Ocr;
    }

    ResolvedMode::Txt
}

/// Resolve the requested method into a concrete mode for this dataset.
///
/// `Auto` classifies PDFs and converted office documents by text layer;
/// images always go through OCR. Explicit modes must be supported by the
/// dataset variant.
pub async fn resolve_mode(
    dataset: &TypedDataset,
    requested: ParseMethod,
) -> Result<ResolvedMode, DatasetError> {
    let mode = match requested {
        ParseMethod::Auto => match dataset.as_classifiable() {
            Some(pdf) => pdf.classify().await,
            None => ResolvedMode::Ocr,
        },
        ParseMethod::Ocr => ResolvedMode::Ocr,
        ParseMethod::Txt => ResolvedMode::Txt,
    };

    if !dataset.supports(mode) {
        return Err(DatasetError::UnsupportedMode {
            mode,
            kind: dataset.kind(),
        });
    }

    tracing::debug!(kind = %dataset.kind(), requested = ?requested, mode = %mode, "Resolved parse mode");
    Ok(mode)
}
