use crate::models::{PhaseStatus, RunContext};
use std::io::ErrorKind;
use std::path::Path;

use super::UnzipService;

async fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_dir_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl UnzipService {
    /// Remove the run's scratch archive and, unless configured to keep them,
    /// the run directory with the extracted files and any intermediate
    /// directories of nested archive names. Only paths created by this run
    /// are removed. Errors are logged and reported, never raised.
    pub(crate) async fn reclaim_scratch(&self, ctx: &RunContext) -> PhaseStatus {
        let mut errors = Vec::new();

        match remove_file_if_exists(ctx.scratch_archive_path()).await {
            Ok(true) => tracing::debug!(
                "Removed scratch archive {}",
                ctx.scratch_archive_path().display()
            ),
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Error in cleaning up scratch archive: {}", e);
                errors.push(format!("scratch archive: {}", e));
            }
        }

        if self.config.keep_extracted_files {
            tracing::info!(
                "Keeping extracted files at {}",
                ctx.scratch_extract_dir().display()
            );
        } else {
            match remove_dir_if_exists(ctx.scratch_run_dir()).await {
                Ok(true) => tracing::debug!(
                    "Removed scratch directory {}",
                    ctx.scratch_run_dir().display()
                ),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Error in cleaning up scratch directory: {}", e);
                    errors.push(format!("scratch directory: {}", e));
                }
            }
        }

        if errors.is_empty() {
            PhaseStatus::Ok
        } else {
            PhaseStatus::failed(errors.join("; "))
        }
    }

    /// Delete the source archive from its bucket.
    pub(crate) async fn delete_source(&self, ctx: &RunContext) -> PhaseStatus {
        match self
            .storage
            .delete_file(ctx.source_bucket(), ctx.object_key())
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "🗑️  Deleted source archive s3://{}/{}",
                    ctx.source_bucket(),
                    ctx.object_key()
                );
                PhaseStatus::Ok
            }
            Err(e) => {
                tracing::error!("Error deleting source archive: {}", e);
                PhaseStatus::failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_missing_paths_is_not_an_error() {
        let scratch = tempfile::tempdir().unwrap();
        assert!(!remove_file_if_exists(&scratch.path().join("gone.zip")).await.unwrap());
        assert!(!remove_dir_if_exists(&scratch.path().join("gone")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_existing_paths() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("archive.zip");
        let dir = scratch.path().join("archive");
        std::fs::write(&file, b"zip").unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/a.txt"), b"a").unwrap();

        assert!(remove_file_if_exists(&file).await.unwrap());
        assert!(remove_dir_if_exists(&dir).await.unwrap());
        assert!(!file.exists());
        assert!(!dir.exists());
    }
}
