//! Bucket credential resolution

use std::collections::HashMap;

use crate::config::StorageConfig;
use crate::error::StorageError;

use super::types::{S3Credentials, DEFAULT_BUCKET_KEY};

/// Looks up credentials for a bucket identifier.
///
/// Injected at startup and consulted once per remote request.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, bucket: &str) -> Result<S3Credentials, StorageError>;
}

/// Resolver backed by the static bucket map from configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigCredentialResolver {
    buckets: HashMap<String, S3Credentials>,
}

impl ConfigCredentialResolver {
    pub fn new(buckets: HashMap<String, S3Credentials>) -> Self {
        Self { buckets }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.buckets.clone())
    }
}

impl CredentialResolver for ConfigCredentialResolver {
    fn resolve(&self, bucket: &str) -> Result<S3Credentials, StorageError> {
        self.buckets
            .get(bucket)
            .or_else(|| self.buckets.get(DEFAULT_BUCKET_KEY))
            .cloned()
            .ok_or_else(|| StorageError::ConfigNotFound(bucket.to_string()))
    }
}
