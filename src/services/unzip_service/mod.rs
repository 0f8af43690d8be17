use crate::config::UnzipperConfig;
use crate::models::{ArchiveTarget, DispatchReport, PhaseStatus, RunOutcome, RunReport};
use crate::services::storage::StorageService;
use aws_lambda_events::event::s3::S3Event;
use std::sync::Arc;

pub mod cleanup;
pub mod dispatch;
pub mod event;
pub mod extract;
pub mod fetch;

pub use dispatch::{list_extracted_files, ExtractedListing};
pub use event::{archive_name_without_extension, interpret};
pub use extract::extract_to_dir;

/// Unpacks an uploaded archive and re-uploads its files.
///
/// Phases run strictly in order: initialize, fetch, extract, dispatch,
/// clean up. A failed fetch or extraction skips the phases that depend on
/// it; cleanup always runs once scratch space has been allocated.
pub struct UnzipService {
    storage: Arc<dyn StorageService>,
    config: UnzipperConfig,
}

impl UnzipService {
    pub fn new(storage: Arc<dyn StorageService>, config: UnzipperConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &UnzipperConfig {
        &self.config
    }

    /// Handle one S3 notification. Never fails; every phase result ends up
    /// in the returned outcome.
    pub async fn run(&self, event: &S3Event) -> RunOutcome {
        // 1. Interpret the event
        let target = match interpret(event) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("No events detected from S3, nothing to do: {}", e);
                return RunOutcome::no_op(e.to_string());
            }
        };
        tracing::info!(
            "🔍 Zip file {} detected in bucket {}",
            target.object_key,
            target.source_bucket
        );

        let archive_name = match archive_name_without_extension(&target.object_key) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Skipping object: {}", e);
                return RunOutcome::no_op(e.to_string());
            }
        };

        let mut ctx = match self.initialize(target.clone(), archive_name.clone()).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!("❌ Error in initialization: {}", e);
                return RunOutcome::Completed(self.aborted_report(target, &archive_name, e));
            }
        };

        // 2. Fetch the archive into scratch space
        let fetch = match self.fetch_archive(&ctx).await {
            Ok(_) => PhaseStatus::Ok,
            Err(e) => {
                tracing::error!("❌ Error in fetching zip file: {}", e);
                ctx.mark_failed();
                PhaseStatus::failed(e)
            }
        };

        // 3. Extract it
        let extract = if fetch.is_ok() {
            match self.extract_archive(&ctx).await {
                Ok(_) => PhaseStatus::Ok,
                Err(e) => {
                    tracing::error!("❌ Error in extracting zip file: {}", e);
                    ctx.mark_failed();
                    PhaseStatus::failed(e)
                }
            }
        } else {
            PhaseStatus::Skipped
        };

        // 4. Upload the extracted files
        let (dispatch, uploads) = if extract.is_ok() {
            match self.dispatch_files(&mut ctx).await {
                Ok(report) if report.failed.is_empty() => (PhaseStatus::Ok, report),
                Ok(report) => (
                    PhaseStatus::failed(format!(
                        "{} of {} uploads failed",
                        report.failed.len(),
                        report.attempted()
                    )),
                    report,
                ),
                Err(e) => {
                    tracing::error!("❌ Error in listing extracted files: {}", e);
                    ctx.mark_failed();
                    (PhaseStatus::failed(e), DispatchReport::default())
                }
            }
        } else {
            (PhaseStatus::Skipped, DispatchReport::default())
        };

        // 5. Clean up
        let source_deletion = if self.config.delete_source_on_success && ctx.success() {
            self.delete_source(&ctx).await
        } else {
            PhaseStatus::Skipped
        };
        let cleanup = self.reclaim_scratch(&ctx).await;

        tracing::info!(
            "✅ Run finished for {}: success={}, uploaded={}, failed={}",
            ctx.object_key(),
            ctx.success(),
            uploads.uploaded.len(),
            uploads.failed.len()
        );

        RunOutcome::Completed(RunReport {
            source_bucket: ctx.source_bucket().to_string(),
            object_key: ctx.object_key().to_string(),
            destination_prefix: ctx.destination_prefix().to_string(),
            initialize: PhaseStatus::Ok,
            fetch,
            extract,
            dispatch,
            uploads,
            source_deletion,
            cleanup,
            success: ctx.success(),
        })
    }

    fn aborted_report(
        &self,
        target: ArchiveTarget,
        archive_name: &str,
        error: crate::error::UnzipError,
    ) -> RunReport {
        RunReport {
            destination_prefix: format!("{}/{}", self.config.destination_bucket, archive_name),
            source_bucket: target.source_bucket,
            object_key: target.object_key,
            initialize: PhaseStatus::failed(error),
            fetch: PhaseStatus::Skipped,
            extract: PhaseStatus::Skipped,
            dispatch: PhaseStatus::Skipped,
            uploads: DispatchReport::default(),
            source_deletion: PhaseStatus::Skipped,
            cleanup: PhaseStatus::Skipped,
            success: false,
        }
    }
}
