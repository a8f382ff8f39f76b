//! Source and destination locations

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Scheme prefix that routes a location to object storage
pub const S3_SCHEME: &str = "s3://";

/// A whole-object location: a local path or a bucket-qualified key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote { bucket: String, key: String },
}

impl Location {
    /// Parse a caller-supplied location.
    ///
    /// `s3://bucket/some/key.pdf` is remote; everything else is a local path.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let Some(rest) = raw.strip_prefix(S3_SCHEME) else {
            if raw.is_empty() {
                return Err(StorageError::InvalidLocation("empty path".to_string()));
            }
            return Ok(Location::Local(PathBuf::from(raw)));
        };

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StorageError::InvalidLocation(format!(
                "missing bucket in {}",
                raw
            )));
        }

        Ok(Location::Remote {
            bucket: bucket.to_string(),
            key: key.trim_start_matches('/').to_string(),
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Remote { .. })
    }

    /// Path or key as the backend addresses it
    pub fn path(&self) -> String {
        match self {
            Location::Local(path) => path.to_string_lossy().to_string(),
            Location::Remote { key, .. } => key.clone(),
        }
    }

    /// Final path segment
    pub fn file_name(&self) -> Option<String> {
        match self {
            Location::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string()),
            Location::Remote { key, .. } => key
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote { bucket, key } => write!(f, "{}{}/{}", S3_SCHEME, bucket, key),
        }
    }
}

/// Extension of a file name without the leading dot (`report.v2.pdf` -> `pdf`)
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
}

/// Base name used for output files: everything before the first dot
pub fn base_name_of(file_name: &str) -> &str {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let location = Location::parse("/data/in/paper.pdf").unwrap();
        assert_eq!(location, Location::Local(PathBuf::from("/data/in/paper.pdf")));
        assert!(!location.is_remote());
        assert_eq!(location.file_name().as_deref(), Some("paper.pdf"));
    }

    #[test]
    fn test_parse_remote() {
        let location = Location::parse("s3://papers/2024/scan.png").unwrap();
        assert_eq!(
            location,
            Location::Remote {
                bucket: "papers".to_string(),
                key: "2024/scan.png".to_string(),
            }
        );
        assert_eq!(location.path(), "2024/scan.png");
        assert_eq!(location.file_name().as_deref(), Some("scan.png"));
        assert_eq!(location.to_string(), "s3://papers/2024/scan.png");
    }

    #[test]
    fn test_parse_rejects_missing_bucket() {
        assert!(matches!(
            Location::parse("s3:///key.pdf"),
            Err(StorageError::InvalidLocation(_))
        ));
        assert!(matches!(
            Location::parse(""),
            Err(StorageError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_names() {
        assert_eq!(extension_of("report.v2.PDF").as_deref(), Some("PDF"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(base_name_of("report.v2.pdf"), "report");
        assert_eq!(base_name_of("dir/sub/slides.pptx"), "slides");
    }
}
