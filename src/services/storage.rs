use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Object store seam used by the pipeline.
///
/// A container is a bucket name optionally followed by `/` and a key prefix,
/// e.g. `extracted/report`. Keys are relative to that prefix.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Download an object into `path`, replacing any existing content.
    /// Returns the number of bytes written.
    async fn download_to_file(&self, container: &str, key: &str, path: &Path) -> Result<u64>;
    async fn upload_file(&self, container: &str, key: &str, data: Vec<u8>) -> Result<()>;
    async fn delete_file(&self, container: &str, key: &str) -> Result<()>;
}

/// Split a container into its bucket and the full object key for `key`.
pub fn resolve_location<'a>(container: &'a str, key: &str) -> (&'a str, String) {
    match container.split_once('/') {
        Some((bucket, prefix)) if !prefix.trim_matches('/').is_empty() => (
            bucket,
            format!("{}/{}", prefix.trim_matches('/'), key.trim_start_matches('/')),
        ),
        Some((bucket, _)) => (bucket, key.to_string()),
        None => (container, key.to_string()),
    }
}

pub struct S3StorageService {
    client: Client,
}

impl S3StorageService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn download_to_file(&self, container: &str, key: &str, path: &Path) -> Result<u64> {
        let (bucket, object_key) = resolve_location(container, key);
        let res = self
            .client
            .get_object()
            .bucket(bucket)
            .key(&object_key)
            .send()
            .await;

        let output = match res {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(
                    "S3 get_object failed: bucket={}, key={}, error={:?}",
                    bucket,
                    object_key,
                    e
                );
                return Err(e.into());
            }
        };

        let mut reader = output.body.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok(written)
    }

    async fn upload_file(&self, container: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let (bucket, object_key) = resolve_location(container, key);
        self.client
            .put_object()
            .bucket(bucket)
            .key(object_key)
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn delete_file(&self, container: &str, key: &str) -> Result<()> {
        let (bucket, object_key) = resolve_location(container, key);
        self.client
            .delete_object()
            .bucket(bucket)
            .key(object_key)
            .send()
            .await?;
        Ok(())
    }
}
