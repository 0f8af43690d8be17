use crate::error::UnzipError;
use crate::models::RunContext;
use std::fs;
use std::path::Path;

use super::UnzipService;

/// Unpack a ZIP archive into `target_dir`, creating directories as needed.
///
/// Entries overwrite existing files of the same relative path. Entries whose
/// names would escape `target_dir` are skipped. Returns the number of files
/// written.
pub fn extract_to_dir(archive_path: &Path, target_dir: &Path) -> Result<usize, UnzipError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    fs::create_dir_all(target_dir)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping ZIP entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}

impl UnzipService {
    pub(crate) async fn extract_archive(&self, ctx: &RunContext) -> Result<usize, UnzipError> {
        let archive_path = ctx.scratch_archive_path().to_path_buf();
        let target_dir = ctx.scratch_extract_dir().to_path_buf();

        let written = tokio::task::spawn_blocking(move || extract_to_dir(&archive_path, &target_dir))
            .await
            .map_err(|e| UnzipError::Extract(format!("extraction task aborted: {}", e)))??;

        tracing::info!(
            "📦 Zip file extracted successfully to {} ({} files)",
            ctx.scratch_extract_dir().display(),
            written
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_files_and_directories() {
        let scratch = tempfile::tempdir().unwrap();
        let archive = scratch.path().join("bundle.zip");
        write_archive(
            &archive,
            &[("a.txt", b"alpha"), ("nested/b.txt", b"beta")],
        );

        let target = scratch.path().join("bundle");
        let written = extract_to_dir(&archive, &target).unwrap();

        assert_eq!(written, 2);
        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(target.join("nested/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_extract_overwrites_existing_entries() {
        let scratch = tempfile::tempdir().unwrap();
        let target = scratch.path().join("bundle");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("a.txt"), b"stale content that is longer").unwrap();
        fs::write(target.join("leftover.txt"), b"untouched").unwrap();

        let archive = scratch.path().join("bundle.zip");
        write_archive(&archive, &[("a.txt", b"fresh")]);

        extract_to_dir(&archive, &target).unwrap();

        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"fresh");
        assert_eq!(fs::read(target.join("leftover.txt")).unwrap(), b"untouched");
    }

    #[test]
    fn test_extract_rejects_corrupt_archive() {
        let scratch = tempfile::tempdir().unwrap();
        let archive = scratch.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let result = extract_to_dir(&archive, &scratch.path().join("broken"));
        assert!(matches!(result, Err(UnzipError::Zip(_))));
    }

    #[test]
    fn test_extract_missing_archive() {
        let scratch = tempfile::tempdir().unwrap();
        let result = extract_to_dir(
            &scratch.path().join("missing.zip"),
            &scratch.path().join("missing"),
        );
        assert!(matches!(result, Err(UnzipError::Io(_))));
    }
}
