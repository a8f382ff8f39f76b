//! Reading-order view of an inference result

use std::cmp::Ordering;
use std::collections::HashSet;

use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::analysis::{BlockCategory, InferenceResult, LayoutBlock};
use crate::dataset::ResolvedMode;
use crate::writer::Writer;

use super::ExportError;

/// Extension of every extracted image crop
pub const IMAGE_EXTENSION: &str = "jpg";

/// A layout block in export form
#[derive(Debug, Clone, Serialize)]
pub struct PipeBlock {
    #[serde(rename = "type")]
    pub category: BlockCategory,
    pub bbox: [f32; 4],
    /// Position in the page's reading order
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    /// File name of the crop written to the image writer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub footnote: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipePage {
    pub page_idx: usize,
    pub page_size: [f32; 2],
    pub para_blocks: Vec<PipeBlock>,
    pub discarded_blocks: Vec<PipeBlock>,
}

/// Mode-specific, export-ready view of one analysis
#[derive(Debug, Clone)]
pub struct PipeResult {
    pages: Vec<PipePage>,
    mode: ResolvedMode,
}

impl PipeResult {
    /// Sort blocks into reading order, split off page furniture and write
    /// every image crop to `image_writer` once, named by content hash.
    pub async fn build(
        inference: &InferenceResult,
        mode: ResolvedMode,
        image_writer: &dyn Writer,
    ) -> Result<Self, ExportError> {
        let mut written = HashSet::new();
        let mut pages = Vec::with_capacity(inference.pages.len());

        for page in &inference.pages {
            let mut ordered: Vec<&LayoutBlock> = page.blocks.iter().collect();
            ordered.sort_by(|a, b| reading_order(a, b));

            let mut para_blocks = Vec::new();
            let mut discarded_blocks = Vec::new();

            for (index, block) in ordered.into_iter().enumerate() {
                let image_path = match &block.image_base64 {
                    Some(encoded) => {
                        let name = store_crop(encoded, image_writer, &mut written).await?;
                        Some(name)
                    }
                    None => None,
                };

                let pipe_block = PipeBlock {
                    category: block.category,
                    bbox: block.bbox,
                    index,
                    text: block.text.clone(),
                    level: block.level,
                    html: block.html.clone(),
                    latex: block.latex.clone(),
                    image_path,
                    caption: block.caption.clone(),
                    footnote: block.footnote.clone(),
                };

                if block.category.is_discarded() {
                    discarded_blocks.push(pipe_block);
                } else {
                    para_blocks.push(pipe_block);
                }
            }

            pages.push(PipePage {
                page_idx: page.page_idx,
                page_size: [page.width, page.height],
                para_blocks,
                discarded_blocks,
            });
        }

        tracing::debug!(
            mode = %mode,
            pages = pages.len(),
            images = written.len(),
            "Built pipe result"
        );

        Ok(Self { pages, mode })
    }

    pub fn pages(&self) -> &[PipePage] {
        &self.pages
    }

    pub fn mode(&self) -> ResolvedMode {
        self.mode
    }
}

/// Explicit order first, then top-to-bottom, then left-to-right
fn reading_order(a: &LayoutBlock, b: &LayoutBlock) -> Ordering {
    let order = |block: &LayoutBlock| block.order.unwrap_or(u32::MAX);
    order(a)
        .cmp(&order(b))
        .then_with(|| a.bbox[1].total_cmp(&b.bbox[1]))
        .then_with(|| a.bbox[0].total_cmp(&b.bbox[0]))
}

async fn store_crop(
    encoded: &str,
    image_writer: &dyn Writer,
    written: &mut HashSet<String>,
) -> Result<String, ExportError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(ExportError::Image)?;
    let name = format!("{}.{}", hex::encode(Sha256::digest(&bytes)), IMAGE_EXTENSION);

    if written.insert(name.clone()) {
        image_writer.write(&name, &bytes).await?;
    }
    Ok(name)
}

/// Path of an image as referenced from exports
pub(crate) fn image_link(image_dir: &str, name: &str) -> String {
    let image_dir = image_dir.trim_end_matches('/');
    if image_dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", image_dir, name)
    }
}
