//! Markdown export

use crate::analysis::BlockCategory;
use crate::writer::Writer;

use super::pipe::{image_link, PipeBlock, PipeResult};
use super::ExportError;

impl PipeResult {
    /// Render the reading flow as markdown
    pub fn markdown(&self, image_dir: &str) -> String {
        let sections: Vec<String> = self
            .pages()
            .iter()
            .flat_map(|page| page.para_blocks.iter())
            .filter_map(|block| render_block(block, image_dir))
            .collect();

        if sections.is_empty() {
            return String::new();
        }
        let mut output = sections.join("\n\n");
        output.push('\n');
        output
    }

    /// Write the markdown export to `writer` under `path`
    pub async fn export_markdown(
        &self,
        writer: &dyn Writer,
        path: &str,
        image_dir: &str,
    ) -> Result<(), ExportError> {
        writer.write_string(path, &self.markdown(image_dir)).await?;
        Ok(())
    }
}

fn render_block(block: &PipeBlock, image_dir: &str) -> Option<String> {
    let image = block
        .image_path
        .as_deref()
        .map(|name| format!("![]({})", image_link(image_dir, name)));

    let parts: Vec<String> = match block.category {
        BlockCategory::Title => {
            let level = block.level.unwrap_or(1).clamp(1, 6) as usize;
            vec![format!("{} {}", "#".repeat(level), non_empty(&block.text)?)]
        }
        BlockCategory::Image => {
            let mut parts: Vec<String> = image.into_iter().collect();
            parts.extend(block.caption.iter().cloned());
            parts.extend(block.footnote.iter().cloned());
            parts
        }
        BlockCategory::Table => {
            let mut parts: Vec<String> = block.caption.clone();
            match block.html.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
                Some(html) => parts.push(html.to_string()),
                None => parts.extend(image),
            }
            parts.extend(block.footnote.iter().cloned());
            parts
        }
        BlockCategory::InterlineEquation => match block.latex.as_deref().map(str::trim) {
            Some(latex) if !latex.is_empty() => vec![format!("$$\n{}\n$$", latex)],
            _ => image.or_else(|| block.text.clone()).into_iter().collect(),
        },
        _ => vec![non_empty(&block.text)?.to_string()],
    };

    let parts: Vec<String> = parts.into_iter().filter(|p| !p.trim().is_empty()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("  \n"))
    }
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}
