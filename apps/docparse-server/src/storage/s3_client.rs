//! S3-compatible storage client
//!
//! Wraps the AWS SDK for S3-compatible storage access.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{http::HttpResponse, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
    Client,
};

use crate::error::StorageError;

use super::types::S3Credentials;

const DEFAULT_REGION: &str = "us-east-1";
const LIST_PAGE_SIZE: i32 = 1000;

/// S3-compatible storage client bound to one bucket
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a client for `bucket` from resolved credentials
    pub fn new(bucket: &str, credentials: &S3Credentials) -> Self {
        let sdk_credentials = Credentials::new(
            &credentials.access_key,
            &credentials.secret_key,
            None,
            None,
            "docparse",
        );

        let region = credentials
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&credentials.endpoint)
            .region(Region::new(region))
            .credentials_provider(sdk_credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.to_string(),
        }
    }

    /// Get an object's data
    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    classify_sdk_error(key, &e, false)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transport(format!("Failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    /// Store an object, replacing any existing object under the same key
    pub async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify_sdk_error(key, &e, true))?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Stored object");
        Ok(())
    }

    /// List every key under a prefix (handles pagination)
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .max_keys(LIST_PAGE_SIZE);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| classify_sdk_error(prefix, &e, false))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(ToString::to_string),
            );

            if !response.is_truncated().unwrap_or(false) {
                break;
            }

            continuation_token = response.next_continuation_token().map(|s| s.to_string());
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(keys)
    }
}

/// Map an SDK error onto the storage taxonomy by HTTP status
fn classify_sdk_error<E>(
    key: &str,
    err: &SdkError<E, HttpResponse>,
    writing: bool,
) -> StorageError
where
    E: std::error::Error + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());
    status_error(key, status, writing).unwrap_or_else(|| {
        StorageError::Transport(format!("{}: {}", key, DisplayErrorContext(err)))
    })
}

fn status_error(key: &str, status: Option<u16>, writing: bool) -> Option<StorageError> {
    match status? {
        404 => Some(StorageError::NotFound(key.to_string())),
        403 if writing => Some(StorageError::PermissionDenied(key.to_string())),
        403 => Some(StorageError::AccessDenied(key.to_string())),
        _ => None,
    }
}
