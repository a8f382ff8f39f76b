//! Configuration management for Docparse Server

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::storage::{S3Credentials, DEFAULT_BUCKET_KEY};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub analyzer: AnalyzerConfig,
    pub staging: StagingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a multipart request body
    pub max_upload_bytes: usize,
}

/// Credentials for every bucket the service may read from or write to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub buckets: HashMap<String, S3Credentials>,
}

/// Options handed to the inference collaborator on every call.
///
/// Built once at startup and owned by the analysis invoker.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    pub inference_url: String,
    pub enable_table: bool,
    pub enable_formula: bool,
    pub lang: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Directory under which request-scoped staging directories are created
    pub root: PathBuf,
    /// LibreOffice binary used for office conversion
    pub soffice_bin: String,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Var(#[from] env::VarError),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to read bucket config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse bucket config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// The bucket map is unusable; falling back to defaults would drop every credential
    pub fn is_bucket_error(&self) -> bool {
        matches!(self, ConfigError::Io(_) | ConfigError::Json(_))
    }
}

/// On-disk bucket map: `{"bucket_info": {"name": [ak, sk, endpoint]}}`
#[derive(Debug, Deserialize)]
struct BucketFile {
    bucket_info: HashMap<String, (String, String, String)>,
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
const DEFAULT_INFERENCE_URL: &str = "http://localhost:8010";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            enable_table: true,
            enable_formula: true,
            lang: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            storage: StorageConfig::default(),
            analyzer: AnalyzerConfig::default(),
            staging: StagingConfig {
                root: env::temp_dir(),
                soffice_bin: "soffice".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            storage: StorageConfig {
                buckets: load_buckets()?,
            },
            analyzer: AnalyzerConfig {
                inference_url: env::var("INFERENCE_URL").unwrap_or(defaults.analyzer.inference_url),
                enable_table: parse_bool_var("ENABLE_TABLE", defaults.analyzer.enable_table)?,
                enable_formula: parse_bool_var("ENABLE_FORMULA", defaults.analyzer.enable_formula)?,
                lang: env::var("OCR_LANG").ok().filter(|l| !l.is_empty()),
                timeout_secs: parse_var("INFERENCE_TIMEOUT_SECS", defaults.analyzer.timeout_secs)?,
            },
            staging: StagingConfig {
                root: env::var("STAGING_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.staging.root),
                soffice_bin: env::var("SOFFICE_BIN").unwrap_or(defaults.staging.soffice_bin),
            },
        })
    }
}

/// Merge the optional JSON bucket map with the single-bucket env variables.
///
/// The env bucket wins on a name clash.
fn load_buckets() -> Result<HashMap<String, S3Credentials>, ConfigError> {
    let mut buckets = HashMap::new();

    if let Ok(path) = env::var("BUCKET_CONFIG_PATH") {
        let raw = std::fs::read_to_string(&path)?;
        buckets.extend(parse_bucket_file(&raw)?);
    }

    if let Ok(bucket) = env::var("S3_BUCKET") {
        buckets.insert(
            bucket,
            S3Credentials {
                access_key: env::var("S3_ACCESS_KEY")?,
                secret_key: env::var("S3_SECRET_KEY")?,
                endpoint: env::var("S3_ENDPOINT")?,
                region: env::var("S3_REGION").ok(),
            },
        );
    }

    Ok(buckets)
}

fn parse_bucket_file(raw: &str) -> Result<HashMap<String, S3Credentials>, ConfigError> {
    let file: BucketFile = serde_json::from_str(raw)?;
    Ok(file
        .bucket_info
        .into_iter()
        .map(|(name, (access_key, secret_key, endpoint))| {
            (
                name,
                S3Credentials {
                    access_key,
                    secret_key,
                    endpoint,
                    region: None,
                },
            )
        })
        .collect())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name, value }),
        },
        Err(_) => Ok(default),
    }
}

/// True when a catch-all bucket entry is configured
pub fn has_default_bucket(storage: &StorageConfig) -> bool {
    storage.buckets.contains_key(DEFAULT_BUCKET_KEY)
}
