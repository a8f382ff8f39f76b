//! Content list export
//!
//! A flat JSON array of the reading flow, one entry per block.

use serde_json::{json, Map, Value};

use crate::analysis::BlockCategory;
use crate::writer::Writer;

use super::pipe::{image_link, PipeBlock, PipeResult};
use super::ExportError;

impl PipeResult {
    pub fn content_list(&self, image_dir: &str) -> Value {
        let entries: Vec<Value> = self
            .pages()
            .iter()
            .flat_map(|page| {
                page.para_blocks
                    .iter()
                    .filter_map(move |block| content_entry(block, page.page_idx, image_dir))
            })
            .collect();
        Value::Array(entries)
    }

    /// Write the content list as pretty-printed JSON
    pub async fn export_content_list(
        &self,
        writer: &dyn Writer,
        path: &str,
        image_dir: &str,
    ) -> Result<(), ExportError> {
        let body = serde_json::to_string_pretty(&self.content_list(image_dir))?;
        writer.write_string(path, &body).await?;
        Ok(())
    }
}

fn content_entry(block: &PipeBlock, page_idx: usize, image_dir: &str) -> Option<Value> {
    let mut entry = Map::new();
    let img_path = block
        .image_path
        .as_deref()
        .map(|name| image_link(image_dir, name));

    match block.category {
        BlockCategory::Image => {
            entry.insert("type".into(), json!("image"));
            entry.insert("img_path".into(), json!(img_path.unwrap_or_default()));
            entry.insert("img_caption".into(), json!(block.caption));
            entry.insert("img_footnote".into(), json!(block.footnote));
        }
        BlockCategory::Table => {
            entry.insert("type".into(), json!("table"));
            if let Some(path) = img_path {
                entry.insert("img_path".into(), json!(path));
            }
            entry.insert("table_caption".into(), json!(block.caption));
            entry.insert("table_footnote".into(), json!(block.footnote));
            if let Some(html) = &block.html {
                entry.insert("table_body".into(), json!(html));
            }
        }
        BlockCategory::InterlineEquation => {
            entry.insert("type".into(), json!("equation"));
            if let Some(path) = img_path {
                entry.insert("img_path".into(), json!(path));
            }
            if let Some(latex) = block.latex.as_deref().filter(|l| !l.trim().is_empty()) {
                entry.insert("text".into(), json!(format!("$$\n{}\n$$", latex.trim())));
                entry.insert("text_format".into(), json!("latex"));
            }
        }
        _ => {
            let text = block.text.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
            entry.insert("type".into(), json!("text"));
            entry.insert("text".into(), json!(text));
            if block.category == BlockCategory::Title {
                entry.insert("text_level".into(), json!(block.level.unwrap_or(1)));
            }
        }
    }

    entry.insert("page_idx".into(), json!(page_idx));
    Some(Value::Object(entry))
}
