//! Inference engines
//!
//! Defines the engine trait and the HTTP implementation that talks to the
//! model service.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use crate::config::AnalyzerConfig;
use crate::dataset::TypedDataset;

use super::types::{InferenceError, InferenceResult};

/// Document analysis collaborator
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Analyze a dataset in OCR or text mode
    async fn analyze(
        &self,
        dataset: TypedDataset,
        ocr: bool,
        config: &AnalyzerConfig,
    ) -> Result<InferenceResult, InferenceError>;

    /// Check if the collaborator is reachable
    async fn is_available(&self) -> bool;
}

/// Engine backed by a remote model service
pub struct HttpInferenceEngine {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpInferenceEngine {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, InferenceError> {
        Self::new(&config.inference_url, config.timeout_secs)
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            InferenceError::Unavailable(e.to_string())
        } else {
            InferenceError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl InferenceEngine for HttpInferenceEngine {
    async fn analyze(
        &self,
        dataset: TypedDataset,
        ocr: bool,
        config: &AnalyzerConfig,
    ) -> Result<InferenceResult, InferenceError> {
        let url = format!("{}/analyze", self.base_url);
        let data = base64::engine::general_purpose::STANDARD.encode(dataset.bytes());

        let request = serde_json::json!({
            "kind": dataset.kind(),
            "data": data,
            "ocr": ocr,
            "options": {
                "table_enable": config.enable_table,
                "formula_enable": config.enable_formula,
                "lang": config.lang,
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} returned {}: {}", url, status, body);
            return Err(if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                InferenceError::Unavailable(message)
            } else if status.is_client_error() {
                InferenceError::Rejected(message)
            } else {
                InferenceError::Transport(message)
            });
        }

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(format!("Failed to parse reply: {}", e)))?;

        InferenceResult::from_value(reply).map_err(|e| InferenceError::Malformed(e.to_string()))
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
