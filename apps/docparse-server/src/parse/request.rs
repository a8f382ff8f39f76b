//! Parse request model and form validation

use crate::dataset::ParseMethod;

use super::ParseError;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Where the document comes from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Upload { file_name: String, bytes: Vec<u8> },
    /// Local path or `s3://bucket/key`
    Path(String),
}

/// Which outputs to compute, return and persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub is_json_md_dump: bool,
    pub output_dir: String,
    pub return_layout: bool,
    pub return_info: bool,
    pub return_content_list: bool,
    pub return_images: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            is_json_md_dump: false,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            return_layout: false,
            return_info: false,
            return_content_list: false,
            return_images: false,
        }
    }
}

impl OutputOptions {
    pub fn needs_content_list(&self) -> bool {
        self.return_content_list || self.is_json_md_dump
    }

    pub fn needs_middle_json(&self) -> bool {
        self.return_info || self.is_json_md_dump
    }

    pub fn needs_model_json(&self) -> bool {
        self.return_layout || self.is_json_md_dump
    }
}

/// A validated parse request
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub source: DocumentSource,
    pub method: ParseMethod,
    pub options: OutputOptions,
}

/// Raw form fields as received
#[derive(Debug, Default)]
pub struct ParseForm {
    pub file: Option<(String, Vec<u8>)>,
    pub file_path: Option<String>,
    pub parse_method: Option<String>,
    pub is_json_md_dump: Option<String>,
    pub output_dir: Option<String>,
    pub return_layout: Option<String>,
    pub return_info: Option<String>,
    pub return_content_list: Option<String>,
    pub return_images: Option<String>,
}

impl ParseForm {
    /// Record a text field. Returns false for unknown names.
    pub fn set_text(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "file_path" => &mut self.file_path,
            "parse_method" => &mut self.parse_method,
            "is_json_md_dump" => &mut self.is_json_md_dump,
            "output_dir" => &mut self.output_dir,
            "return_layout" => &mut self.return_layout,
            "return_info" => &mut self.return_info,
            "return_content_list" => &mut self.return_content_list,
            "return_images" => &mut self.return_images,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Record an uploaded file. An empty part without a name counts as absent.
    pub fn set_file(&mut self, file_name: String, bytes: Vec<u8>) {
        if file_name.is_empty() && bytes.is_empty() {
            return;
        }
        self.file = Some((file_name, bytes));
    }

    pub fn into_request(self) -> Result<ParseRequest, ParseError> {
        let file_path = self.file_path.filter(|p| !p.trim().is_empty());

        let source = match (self.file, file_path) {
            (Some(_), Some(_)) => {
                return Err(ParseError::InputValidation(
                    "Provide either file or file_path, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(ParseError::InputValidation(
                    "Must provide either file or file_path".to_string(),
                ))
            }
            (Some((file_name, bytes)), None) => {
                if file_name.trim().is_empty() {
                    return Err(ParseError::InputValidation(
                        "Uploaded file has no name".to_string(),
                    ));
                }
                DocumentSource::Upload { file_name, bytes }
            }
            (None, Some(path)) => DocumentSource::Path(path.trim().to_string()),
        };

        let method = match self.parse_method.as_deref().map(str::trim) {
            None | Some("") => ParseMethod::default(),
            Some(raw) => raw.parse::<ParseMethod>()?,
        };

        let options = OutputOptions {
            is_json_md_dump: parse_flag("is_json_md_dump", self.is_json_md_dump)?,
            output_dir: self
                .output_dir
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            return_layout: parse_flag("return_layout", self.return_layout)?,
            return_info: parse_flag("return_info", self.return_info)?,
            return_content_list: parse_flag("return_content_list", self.return_content_list)?,
            return_images: parse_flag("return_images", self.return_images)?,
        };

        Ok(ParseRequest {
            source,
            method,
            options,
        })
    }
}

/// Parse a boolean form value (`true/false/1/0/yes/no/on/off`)
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ParseError::InputValidation(format!(
            "Invalid boolean for {}: {}",
            name, other
        ))),
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool, ParseError> {
    match value {
        Some(value) if !value.trim().is_empty() => parse_bool(name, &value),
        _ => Ok(false),
    }
}
