//! Document analysis
//!
//! The inference collaborator, its result types, and the invoker that runs
//! one analysis per request.

mod engine;
mod invoker;
mod types;

pub use engine::{HttpInferenceEngine, InferenceEngine};
pub use invoker::{AnalysisFailed, AnalysisInvoker};
pub use types::*;
