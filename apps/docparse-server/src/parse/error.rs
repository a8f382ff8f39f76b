//! Parse request errors

use axum::http::StatusCode;

use crate::analysis::AnalysisFailed;
use crate::dataset::DatasetError;
use crate::error::StorageError;
use crate::export::ExportError;
use crate::writer::WriterError;

/// Everything that can end a parse request
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid request: {0}")]
    InputValidation(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Analysis(#[from] AnalysisFailed),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Writer(#[from] WriterError),
}

impl ParseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ParseError::InputValidation(_) => StatusCode::BAD_REQUEST,
            ParseError::Dataset(e) => match e {
                DatasetError::UnsupportedFormat(_)
                | DatasetError::UnknownMethod(_)
                | DatasetError::UnsupportedMode { .. }
                | DatasetError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
                DatasetError::ConversionFailed(_) | DatasetError::Staging(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ParseError::Storage(e) => match e {
                StorageError::NotFound(_) | StorageError::InvalidLocation(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ParseError::Analysis(_) | ParseError::Export(_) | ParseError::Writer(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller; internal details stay in logs
    pub fn public_message(&self) -> String {
        match self {
            ParseError::Storage(StorageError::ConfigNotFound(_)) => {
                "Storage is not configured for the requested location".to_string()
            }
            ParseError::Analysis(_) => "Document analysis failed".to_string(),
            ParseError::Dataset(DatasetError::ConversionFailed(_)) => {
                "Office document conversion failed".to_string()
            }
            ParseError::Writer(WriterError::Decode { .. }) => {
                "Failed to assemble parse output".to_string()
            }
            _ if self.status_code().is_client_error() => self.to_string(),
            _ => "Failed to process document".to_string(),
        }
    }
}
