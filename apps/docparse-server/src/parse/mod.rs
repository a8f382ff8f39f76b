//! Parse requests
//!
//! Request validation, orchestration, and the response bundle.

mod bundle;
mod error;
mod request;
mod service;

pub use bundle::{OutputBundle, CONTENT_LIST, IMAGES, INFO, LAYOUT, MD_CONTENT};
pub use error::ParseError;
pub use request::{
    parse_bool, DocumentSource, OutputOptions, ParseForm, ParseRequest, DEFAULT_OUTPUT_DIR,
};
pub use service::{ParseService, IMAGE_DIR, MAX_INLINE_IMAGES};
