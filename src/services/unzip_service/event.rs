use crate::error::UnzipError;
use crate::models::{ArchiveTarget, RunContext};
use aws_lambda_events::event::s3::S3Event;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

use super::UnzipService;

/// Length of the archive extension stripped from the object key (".zip").
pub const EXTENSION_LEN: usize = 4;

/// Read the bucket and key of the first record. Later records are ignored.
pub fn interpret(event: &S3Event) -> Result<ArchiveTarget, UnzipError> {
    let record = event
        .records
        .first()
        .ok_or_else(|| UnzipError::MalformedEvent("no records in S3 event".to_string()))?;

    if event.records.len() > 1 {
        tracing::warn!(
            "S3 event carries {} records, only the first is processed",
            event.records.len()
        );
    }

    let source_bucket = record
        .s3
        .bucket
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UnzipError::MalformedEvent("record has no bucket name".to_string()))?;

    let raw_key = record
        .s3
        .object
        .key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| UnzipError::MalformedEvent("record has no object key".to_string()))?;

    Ok(ArchiveTarget {
        source_bucket,
        object_key: decode_key(raw_key),
    })
}

/// S3 notifications carry keys form-urlencoded: `+` for space, `%XX` escapes.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Strip the fixed-length extension from an object key: `report.zip` -> `report`.
pub fn archive_name_without_extension(key: &str) -> Result<String, UnzipError> {
    match key.char_indices().rev().nth(EXTENSION_LEN - 1) {
        Some((cut, _)) if cut > 0 => Ok(key[..cut].to_string()),
        _ => Err(UnzipError::InvalidKey(format!(
            "'{}' is too short to carry a {}-character extension",
            key, EXTENSION_LEN
        ))),
    }
}

/// Extraction directory for an archive name under the scratch root.
///
/// Only plain path components of the name are kept, so the directory always
/// lies strictly below `scratch_root`.
pub fn extract_dir_for(scratch_root: &Path, archive_name: &str) -> Result<PathBuf, UnzipError> {
    let mut dir = scratch_root.to_path_buf();
    let mut depth = 0;
    for component in Path::new(archive_name).components() {
        if let Component::Normal(part) = component {
            dir.push(part);
            depth += 1;
        }
    }

    if depth == 0 {
        return Err(UnzipError::InvalidKey(format!(
            "archive name '{}' has no usable path component",
            archive_name
        )));
    }
    Ok(dir)
}

impl UnzipService {
    /// Resolve every name and path of the run and allocate its scratch space:
    /// a fresh run directory under the scratch root holding the (empty)
    /// archive download target. Nothing outside that directory is touched.
    pub(crate) async fn initialize(
        &self,
        target: ArchiveTarget,
        archive_name: String,
    ) -> Result<RunContext, UnzipError> {
        let scratch_root = &self.config.scratch_root;
        // Reject unusable names before anything is created on disk
        extract_dir_for(scratch_root, &archive_name)?;

        tokio::fs::create_dir_all(scratch_root).await?;
        let scratch_run_dir = tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(scratch_root)?
            .keep();
        let scratch_extract_dir = extract_dir_for(&scratch_run_dir, &archive_name)?;

        let scratch_archive_path = tempfile::Builder::new()
            .prefix("archive-")
            .suffix(".zip")
            .tempfile_in(&scratch_run_dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;

        tracing::info!(
            "Scratch dir: {}, temp file name: {}",
            scratch_run_dir.display(),
            scratch_archive_path.display()
        );

        Ok(RunContext::new(
            target,
            archive_name,
            self.config.destination_bucket.clone(),
            scratch_run_dir,
            scratch_archive_path,
            scratch_extract_dir,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with_records(records: Vec<serde_json::Value>) -> S3Event {
        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    fn record(bucket: &str, key: &str) -> serde_json::Value {
        json!({
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "us-east-1",
            "eventTime": "2024-01-01T00:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": { "principalId": "EXAMPLE" },
            "requestParameters": { "sourceIPAddress": "127.0.0.1" },
            "responseElements": {
                "x-amz-request-id": "EXAMPLE123456789",
                "x-amz-id-2": "EXAMPLE123/abcdefgh"
            },
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "unzip-trigger",
                "bucket": {
                    "name": bucket,
                    "ownerIdentity": { "principalId": "EXAMPLE" },
                    "arn": format!("arn:aws:s3:::{}", bucket)
                },
                "object": {
                    "key": key,
                    "size": 1024,
                    "eTag": "0123456789abcdef0123456789abcdef",
                    "sequencer": "0A1B2C3D4E5F678901"
                }
            }
        })
    }

    #[test]
    fn test_archive_name_strips_extension() {
        assert_eq!(archive_name_without_extension("report.zip").unwrap(), "report");
        assert_eq!(archive_name_without_extension("a.zip").unwrap(), "a");
        assert_eq!(
            archive_name_without_extension("uploads/2024/q1.zip").unwrap(),
            "uploads/2024/q1"
        );
        // Fixed length, whatever the extension is
        assert_eq!(archive_name_without_extension("data.tgz").unwrap(), "data");
    }

    #[test]
    fn test_archive_name_multibyte_key() {
        assert_eq!(archive_name_without_extension("résumé.zip").unwrap(), "résumé");
        assert_eq!(archive_name_without_extension("档案.zip").unwrap(), "档案");
    }

    #[test]
    fn test_archive_name_rejects_short_keys() {
        assert!(matches!(
            archive_name_without_extension(".zip"),
            Err(UnzipError::InvalidKey(_))
        ));
        assert!(archive_name_without_extension("zip").is_err());
        assert!(archive_name_without_extension("").is_err());
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("my+report.zip"), "my report.zip");
        assert_eq!(decode_key("folder%2Fq1%20final.zip"), "folder/q1 final.zip");
        assert_eq!(decode_key("plain.zip"), "plain.zip");
    }

    #[test]
    fn test_interpret_first_record() {
        let event = event_with_records(vec![
            record("source-bucket", "report.zip"),
            record("other-bucket", "ignored.zip"),
        ]);

        let target = interpret(&event).unwrap();
        assert_eq!(target.source_bucket, "source-bucket");
        assert_eq!(target.object_key, "report.zip");
    }

    #[test]
    fn test_interpret_decodes_key() {
        let event = event_with_records(vec![record("source-bucket", "monthly+report%281%29.zip")]);
        let target = interpret(&event).unwrap();
        assert_eq!(target.object_key, "monthly report(1).zip");
    }

    #[test]
    fn test_interpret_empty_event() {
        let event = event_with_records(vec![]);
        assert!(matches!(
            interpret(&event),
            Err(UnzipError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_extract_dir_for() {
        let root = Path::new("/tmp");
        assert_eq!(
            extract_dir_for(root, "report").unwrap(),
            PathBuf::from("/tmp/report")
        );
        assert_eq!(
            extract_dir_for(root, "uploads/q1").unwrap(),
            PathBuf::from("/tmp/uploads/q1")
        );
        assert_eq!(
            extract_dir_for(root, "../../etc").unwrap(),
            PathBuf::from("/tmp/etc")
        );
        assert!(extract_dir_for(root, "..").is_err());
    }
}
