use crate::error::UnzipError;
use crate::models::RunContext;

use super::UnzipService;

impl UnzipService {
    /// Download the source archive into the run's scratch file.
    pub(crate) async fn fetch_archive(&self, ctx: &RunContext) -> Result<u64, UnzipError> {
        let bytes = self
            .storage
            .download_to_file(
                ctx.source_bucket(),
                ctx.object_key(),
                ctx.scratch_archive_path(),
            )
            .await
            .map_err(|source| UnzipError::Fetch {
                bucket: ctx.source_bucket().to_string(),
                key: ctx.object_key().to_string(),
                source,
            })?;

        tracing::info!(
            "📥 Downloaded s3://{}/{} ({} bytes) to {}",
            ctx.source_bucket(),
            ctx.object_key(),
            bytes,
            ctx.scratch_archive_path().display()
        );
        Ok(bytes)
    }
}
