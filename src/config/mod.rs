use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Subdirectory of the system temp dir owned by this crate.
pub const SCRATCH_DIR_NAME: &str = "s3-unzipper";

/// Runtime configuration for the unzip pipeline
#[derive(Debug, Clone)]
pub struct UnzipperConfig {
    /// Bucket receiving the extracted files (required)
    pub destination_bucket: String,

    /// Local root for per-run scratch directories (default: `<system temp dir>/s3-unzipper`)
    pub scratch_root: PathBuf,

    /// Maximum number of uploads in flight (default: 4, 1 = sequential)
    pub upload_concurrency: usize,

    /// Leave the extraction directory on disk after the run (default: false)
    pub keep_extracted_files: bool,

    /// Delete the source archive once every file has been uploaded (default: false)
    pub delete_source_on_success: bool,

    /// Report an unsuccessful run to the host as an invocation error (default: false)
    pub fail_invocation_on_error: bool,

    /// Custom S3 endpoint, e.g. MinIO or LocalStack
    pub s3_endpoint: Option<String>,

    /// Use path-style addressing against the custom endpoint (default: false)
    pub s3_force_path_style: bool,
}

impl Default for UnzipperConfig {
    fn default() -> Self {
        Self {
            destination_bucket: String::new(),
            scratch_root: env::temp_dir().join(SCRATCH_DIR_NAME),
            upload_concurrency: 4,
            keep_extracted_files: false,
            delete_source_on_success: false,
            fail_invocation_on_error: false,
            s3_endpoint: None,
            s3_force_path_style: false,
        }
    }
}

impl UnzipperConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let default = Self::default();

        let destination_bucket = env::var("DESTINATION_BUCKET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .context("DESTINATION_BUCKET must be set")?;

        Ok(Self {
            destination_bucket,

            scratch_root: env::var("SCRATCH_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_root),

            upload_concurrency: env::var("UPLOAD_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.upload_concurrency),

            keep_extracted_files: env::var("KEEP_EXTRACTED_FILES")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.keep_extracted_files),

            delete_source_on_success: env::var("DELETE_SOURCE_ON_SUCCESS")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.delete_source_on_success),

            fail_invocation_on_error: env::var("FAIL_INVOCATION_ON_ERROR")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.fail_invocation_on_error),

            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            s3_force_path_style: env::var("S3_FORCE_PATH_STYLE")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.s3_force_path_style),
        })
    }

    /// Config for a given destination bucket with all other values defaulted
    pub fn with_destination(bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: bucket.into(),
            ..Self::default()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
