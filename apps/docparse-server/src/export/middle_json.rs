//! Middle JSON export: per-page blocks plus parse metadata

use serde_json::{json, Value};

use crate::writer::Writer;

use super::pipe::PipeResult;
use super::ExportError;

impl PipeResult {
    pub fn middle_json(&self) -> Value {
        json!({
            "pdf_info": self.pages(),
            "_parse_type": self.mode().as_str(),
            "_version_name": env!("CARGO_PKG_VERSION"),
        })
    }

    pub async fn export_middle_json(&self, writer: &dyn Writer, path: &str) -> Result<(), ExportError> {
        let body = serde_json::to_string_pretty(&self.middle_json())?;
        writer.write_string(path, &body).await?;
        Ok(())
    }
}
