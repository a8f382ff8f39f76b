//! Docparse Server
//!
//! Orchestration layer of a document-parse service: accepts a document as an
//! upload or a storage path, analyzes it through an inference collaborator
//! and returns markdown plus structured exports, optionally persisting them
//! to local disk or S3-compatible storage.

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod parse;
pub mod routes;
pub mod state;
pub mod storage;
pub mod writer;
