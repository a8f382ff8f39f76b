//! Analysis invoker

use std::sync::Arc;

use crate::config::AnalyzerConfig;
use crate::dataset::{ResolvedMode, TypedDataset};

use super::engine::InferenceEngine;
use super::types::{InferenceError, InferenceResult};

/// Analysis failed; the collaborator's error is kept as the source
#[derive(Debug, thiserror::Error)]
#[error("Document analysis failed: {source}")]
pub struct AnalysisFailed {
    #[source]
    pub source: InferenceError,
}

/// Runs one analysis per dataset with options fixed at construction
#[derive(Clone)]
pub struct AnalysisInvoker {
    engine: Arc<dyn InferenceEngine>,
    config: AnalyzerConfig,
}

impl AnalysisInvoker {
    pub fn new(engine: Arc<dyn InferenceEngine>, config: AnalyzerConfig) -> Self {
        Self { engine, config }
    }

    /// Analyze `dataset` in `mode`. No retries.
    pub async fn invoke(
        &self,
        dataset: TypedDataset,
        mode: ResolvedMode,
    ) -> Result<InferenceResult, AnalysisFailed> {
        let kind = dataset.kind();
        tracing::info!(kind = %kind, mode = %mode, "Invoking document analysis");

        match self.engine.analyze(dataset, mode.is_ocr(), &self.config).await {
            Ok(result) => {
                tracing::info!(kind = %kind, mode = %mode, pages = result.page_count(), "Analysis complete");
                Ok(result)
            }
            Err(source) => {
                tracing::error!(kind = %kind, mode = %mode, "Analysis failed: {}", source);
                Err(AnalysisFailed { source })
            }
        }
    }
}
