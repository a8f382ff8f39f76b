//! Response payload

use serde::Serialize;
use serde_json::{Map, Value};

pub const MD_CONTENT: &str = "md_content";
pub const LAYOUT: &str = "layout";
pub const INFO: &str = "info";
pub const CONTENT_LIST: &str = "content_list";
pub const IMAGES: &str = "images";

/// Requested outputs keyed by name; `md_content` is always present
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OutputBundle(Map<String, Value>);

impl OutputBundle {
    pub fn new(md_content: String) -> Self {
        let mut map = Map::new();
        map.insert(MD_CONTENT.to_string(), Value::String(md_content));
        Self(map)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
