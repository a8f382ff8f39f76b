//! Storage types

use serde::{Deserialize, Serialize};

/// Bucket entry used when no bucket-specific credentials are registered
pub const DEFAULT_BUCKET_KEY: &str = "[default]";

/// Credentials and endpoint for one S3-compatible bucket
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish()
    }
}
