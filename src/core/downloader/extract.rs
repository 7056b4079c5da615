use std::error::Error as _;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::error::{ManagerError, ManagerResult};
use crate::core::filesystem::clear_readonly;
use crate::core::step::{StepFailure, StepResult};

/// Expand the zip at `archive_path` into `dest`, which must already exist.
///
/// On failure the log carries the error and, when distinct, its inner causes.
/// On success every top-level extracted file is made writable so a later
/// delete is not blocked.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> StepResult {
    let mut log = Vec::new();

    if !dest.is_dir() {
        return Err(StepFailure::new(
            log,
            ManagerError::Other(format!(
                "Extraction target {} does not exist",
                dest.display()
            )),
        ));
    }

    let files = match unpack(archive_path, dest, &mut log) {
        Ok(files) => files,
        Err(error) => {
            log_error_chain(&mut log, &error);
            return Err(StepFailure { log, error });
        }
    };
    log.push(format!("Extracted {files} files"));

    if let Err(error) = clear_top_level_readonly(dest) {
        log_error_chain(&mut log, &error);
        return Err(StepFailure { log, error });
    }

    Ok(log)
}

fn unpack(archive_path: &Path, dest: &Path, log: &mut Vec<String>) -> ManagerResult<usize> {
    let zip_file =
        fs::File::open(archive_path).map_err(|source| ManagerError::io(archive_path, source))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;
    let mut files = 0;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        let Some(rel_path) = zipped.enclosed_name() else {
            warn!("Skipping unsafe zip entry {:?}", zipped.name());
            log.push(format!("Skipped unsafe entry {}", zipped.name()));
            continue;
        };

        let out_path = dest.join(rel_path);
        if zipped.is_dir() {
            fs::create_dir_all(&out_path).map_err(|source| ManagerError::io(&out_path, source))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ManagerError::io(parent, source))?;
        }

        let mut out =
            fs::File::create(&out_path).map_err(|source| ManagerError::io(&out_path, source))?;
        std::io::copy(&mut zipped, &mut out)
            .map_err(|source| ManagerError::io(&out_path, source))?;
        files += 1;
    }

    debug!("Unpacked {} files from {:?}", files, archive_path);
    Ok(files)
}

fn clear_top_level_readonly(dest: &Path) -> ManagerResult<()> {
    for entry in fs::read_dir(dest).map_err(|source| ManagerError::io(dest, source))? {
        let entry = entry.map_err(|source| ManagerError::io(dest, source))?;
        let path = entry.path();
        if path.is_file() {
            clear_readonly(&path)?;
        }
    }
    Ok(())
}

fn log_error_chain(log: &mut Vec<String>, error: &ManagerError) {
    let top = error.to_string();
    log.push(format!("Error: {top}"));

    let mut cause = error.source();
    while let Some(inner) = cause {
        let message = inner.to_string();
        if !top.contains(&message) {
            log.push(format!("Caused by: {message}"));
        }
        cause = inner.source();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_entries() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("bundle.zip");
        write_zip(
            &archive,
            &[
                ("Profile.xml", "<Profile/>"),
                ("Maps/", ""),
                ("Maps/LON.xml", "<Maps/>"),
            ],
        );
        let dest = root.path().join("EGLL");
        fs::create_dir(&dest).unwrap();

        let log = extract_archive(&archive, &dest).unwrap();
        assert_eq!(log.last().unwrap(), "Extracted 2 files");
        assert!(dest.join("Profile.xml").is_file());
        assert!(dest.join("Maps/LON.xml").is_file());
    }

    #[test]
    fn missing_destination_fails() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("bundle.zip");
        write_zip(&archive, &[("a.txt", "a")]);

        let failure = extract_archive(&archive, &root.path().join("absent")).unwrap_err();
        assert!(failure.log[0].contains("does not exist"));
    }

    #[test]
    fn corrupt_archive_is_logged() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("bundle.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let failure = extract_archive(&archive, root.path()).unwrap_err();
        assert!(matches!(failure.error, ManagerError::Zip(_)));
        assert!(failure.log[0].starts_with("Error: Zip extraction error"));
    }
}
