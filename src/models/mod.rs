use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source location of the archive named by a notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTarget {
    pub source_bucket: String,
    pub object_key: String,
}

/// State threaded through one invocation.
///
/// All names and paths are resolved once, before any archive I/O, and never
/// change afterwards. Only the success flag is mutated as phases run.
#[derive(Debug)]
pub struct RunContext {
    source_bucket: String,
    object_key: String,
    archive_name: String,
    destination_bucket: String,
    destination_prefix: String,
    scratch_run_dir: PathBuf,
    scratch_archive_path: PathBuf,
    scratch_extract_dir: PathBuf,
    success: bool,
}

impl RunContext {
    pub fn new(
        target: ArchiveTarget,
        archive_name: String,
        destination_bucket: String,
        scratch_run_dir: PathBuf,
        scratch_archive_path: PathBuf,
        scratch_extract_dir: PathBuf,
    ) -> Self {
        let destination_prefix = format!("{}/{}", destination_bucket, archive_name);
        Self {
            source_bucket: target.source_bucket,
            object_key: target.object_key,
            archive_name,
            destination_bucket,
            destination_prefix,
            scratch_run_dir,
            scratch_archive_path,
            scratch_extract_dir,
            success: true,
        }
    }

    pub fn source_bucket(&self) -> &str {
        &self.source_bucket
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    /// `<destination bucket>/<archive name>`
    pub fn destination_prefix(&self) -> &str {
        &self.destination_prefix
    }

    /// Directory created for this run only; holds the archive and the
    /// extraction directory.
    pub fn scratch_run_dir(&self) -> &Path {
        &self.scratch_run_dir
    }

    pub fn scratch_archive_path(&self) -> &Path {
        &self.scratch_archive_path
    }

    pub fn scratch_extract_dir(&self) -> &Path {
        &self.scratch_extract_dir
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn mark_failed(&mut self) {
        self.success = false;
    }
}

/// A file found directly under the extraction directory.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Ok,
    Skipped,
    Failed { reason: String },
}

impl PhaseStatus {
    pub fn failed(reason: impl ToString) -> Self {
        PhaseStatus::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PhaseStatus::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub file_name: String,
    pub reason: String,
}

/// Per-file results of the upload dispatch phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<UploadFailure>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub source_bucket: String,
    pub object_key: String,
    pub destination_prefix: String,
    pub initialize: PhaseStatus,
    pub fetch: PhaseStatus,
    pub extract: PhaseStatus,
    pub dispatch: PhaseStatus,
    pub uploads: DispatchReport,
    pub source_deletion: PhaseStatus,
    pub cleanup: PhaseStatus,
    pub success: bool,
}

/// What a single invocation reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    NoOp { reason: String },
    Completed(RunReport),
}

impl RunOutcome {
    pub fn no_op(reason: impl Into<String>) -> Self {
        RunOutcome::NoOp {
            reason: reason.into(),
        }
    }

    /// A no-op is not a failure; a completed run is successful only if every
    /// fatal phase passed and every extracted file was uploaded.
    pub fn is_success(&self) -> bool {
        match self {
            RunOutcome::NoOp { .. } => true,
            RunOutcome::Completed(report) => report.success,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::NoOp { .. } => None,
            RunOutcome::Completed(report) => Some(report),
        }
    }
}
