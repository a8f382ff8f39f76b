//! Inference result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Layout category assigned by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Title,
    Text,
    Image,
    Table,
    InterlineEquation,
    Header,
    Footer,
    PageNumber,
    Abandon,
    #[serde(other)]
    Other,
}

impl BlockCategory {
    /// Page furniture that is kept out of the reading flow
    pub fn is_discarded(self) -> bool {
        matches!(
            self,
            Self::Header | Self::Footer | Self::PageNumber | Self::Abandon
        )
    }
}

/// One detected region on a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBlock {
    pub category: BlockCategory,
    /// `[x0, y0, x1, y1]` in page coordinates
    pub bbox: [f32; 4],
    #[serde(default)]
    pub score: f32,
    /// Reading-order index, when the model provides one
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
    /// Heading level for titles
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub latex: Option<String>,
    /// JPEG crop of the region, base64 encoded
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub caption: Vec<String>,
    #[serde(default)]
    pub footnote: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInference {
    pub page_idx: usize,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub blocks: Vec<LayoutBlock>,
}

#[derive(Deserialize)]
struct Reply {
    pages: Vec<PageInference>,
}

/// Output of the inference collaborator.
///
/// `pages` is the typed view used for exports; `model` is the reply exactly
/// as the collaborator sent it.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub pages: Vec<PageInference>,
    model: Value,
}

impl InferenceResult {
    /// Build from a raw collaborator reply, keeping the reply verbatim
    pub fn from_value(model: Value) -> Result<Self, serde_json::Error> {
        let reply = Reply::deserialize(&model)?;
        Ok(Self {
            pages: reply.pages,
            model,
        })
    }

    /// Raw model output
    pub fn model_json(&self) -> &Value {
        &self.model
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Inference collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Inference timed out after {0}s")]
    Timeout(u64),

    #[error("Inference service unavailable: {0}")]
    Unavailable(String),

    #[error("Inference transport error: {0}")]
    Transport(String),

    #[error("Malformed inference reply: {0}")]
    Malformed(String),

    #[error("Inference request rejected: {0}")]
    Rejected(String),
}
