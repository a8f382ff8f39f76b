//! Storage module for local and S3-compatible backends
//!
//! Whole-object reads and writes over the local filesystem or any S3-compatible
//! service (MinIO, Cloudflare R2, AWS S3). The backend is chosen per location:
//! `s3://bucket/key` goes to object storage, anything else is a local path.

mod backend;
mod credentials;
mod location;
mod s3_client;
mod types;

pub use crate::error::StorageError;
pub use backend::{Backend, Storage};
pub use credentials::{ConfigCredentialResolver, CredentialResolver};
pub use location::{base_name_of, extension_of, Location, S3_SCHEME};
pub use s3_client::S3Client;
pub use types::*;
