use crate::error::UnzipError;
use crate::models::{DispatchReport, ExtractedFile, RunContext, UploadFailure};
use futures::StreamExt;
use std::path::Path;

use super::UnzipService;

/// Files found directly under an extraction directory.
#[derive(Debug, Default)]
pub struct ExtractedListing {
    pub files: Vec<ExtractedFile>,
    /// Lossy renderings of names that are not valid UTF-8 and so cannot be
    /// used as object keys.
    pub unusable_names: Vec<String>,
}

/// Regular files directly under `dir`, in directory enumeration order.
/// Subdirectories are not descended into.
pub async fn list_extracted_files(dir: &Path) -> Result<ExtractedListing, UnzipError> {
    let mut listing = ExtractedListing::default();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(file_name) => listing.files.push(ExtractedFile {
                path: entry.path(),
                file_name,
            }),
            Err(raw) => {
                let lossy = raw.to_string_lossy().into_owned();
                tracing::warn!("Skipping extracted file with non UTF-8 name: {}", lossy);
                listing.unusable_names.push(lossy);
            }
        }
    }

    Ok(listing)
}

impl UnzipService {
    /// Upload every extracted file under the run's destination prefix.
    ///
    /// A failed upload is recorded and clears the run's success flag; the
    /// remaining files are still attempted.
    pub(crate) async fn dispatch_files(
        &self,
        ctx: &mut RunContext,
    ) -> Result<DispatchReport, UnzipError> {
        let ExtractedListing {
            files,
            unusable_names,
        } = list_extracted_files(ctx.scratch_extract_dir()).await?;
        tracing::info!(
            "Uploading {} files of archive {} to bucket {} under {}",
            files.len(),
            ctx.archive_name(),
            ctx.destination_bucket(),
            ctx.destination_prefix()
        );

        let container = ctx.destination_prefix().to_string();
        let results: Vec<(String, Result<(), UnzipError>)> = futures::stream::iter(files)
            .map(|file| {
                let container = &container;
                async move {
                    let result = self.upload_extracted_file(container, &file).await;
                    (file.file_name, result)
                }
            })
            .buffer_unordered(self.config.upload_concurrency.max(1))
            .collect()
            .await;

        let mut report = DispatchReport::default();
        for file_name in unusable_names {
            ctx.mark_failed();
            report.failed.push(UploadFailure {
                file_name,
                reason: "file name is not valid UTF-8".to_string(),
            });
        }
        for (file_name, result) in results {
            match result {
                Ok(()) => report.uploaded.push(file_name),
                Err(e) => {
                    tracing::error!("❌ Error in copying extracted file {}: {}", file_name, e);
                    ctx.mark_failed();
                    report.failed.push(UploadFailure {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn upload_extracted_file(
        &self,
        container: &str,
        file: &ExtractedFile,
    ) -> Result<(), UnzipError> {
        let data = tokio::fs::read(&file.path).await?;
        let size = data.len();

        self.storage
            .upload_file(container, &file.file_name, data)
            .await
            .map_err(|source| UnzipError::Upload {
                file: file.file_name.clone(),
                source,
            })?;

        tracing::info!(
            "File {} ({} bytes) copied successfully to {}",
            file.file_name,
            size,
            container
        );
        Ok(())
    }
}
