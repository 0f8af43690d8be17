use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnzipError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Fetch failed for s3://{bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Extraction failed: {0}")]
    Extract(String),

    #[error("Upload of {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
