use crate::error::AppbakError;
use crate::matcher::relative_name;
use crate::Result;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Build a compressed archive from a directory tree.
///
/// Entries are every file and directory under `source_dir` with paths
/// relative to `source_dir`, without an enclosing root segment. Any pre-existing
/// file at `archive_path` is deleted first. Success requires the archive to
/// exist non-empty afterwards.
pub fn compress(source_dir: &Path, archive_path: &Path) -> Result<()> {
    if archive_path.exists() {
        fs::remove_file(archive_path)?;
    }

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let name = relative_name(source_dir, entry.path())?;

        if entry.file_type().is_dir() {
            writer.add_directory(name.as_str(), options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name.as_str(), options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut writer)?;
        }
    }

    writer.finish()?;

    let produced = fs::metadata(archive_path);
    match produced {
        Ok(metadata) if metadata.len() > 0 => Ok(()),
        _ => Err(AppbakError::ArchiveNotCreated {
            path: archive_path.to_path_buf(),
        }),
    }
}

/// Extract every entry under the top-level folder `folder_name` into
/// `target_dir`.
///
/// Entry selection is case-insensitive on the `folder_name + "/"` prefix.
/// The prefix is stripped, intermediate directories are recreated, and
/// existing files are overwritten. Directory-only entries create the
/// directory without a file write. Fails with `NoArchiveData` when nothing
/// in the archive falls under the folder.
pub fn extract_folder(archive_path: &Path, folder_name: &str, target_dir: &Path) -> Result<()> {
    if !archive_path.is_file() {
        return Err(AppbakError::ArchiveNotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let prefix = format!("{}/", folder_name.trim_end_matches('/'));
    let prefix_lower = prefix.to_lowercase();

    let mut selected = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.name().to_lowercase().starts_with(&prefix_lower) {
            selected.push(index);
        }
    }

    if selected.is_empty() {
        return Err(AppbakError::NoArchiveData {
            folder: folder_name.to_string(),
        });
    }

    fs::create_dir_all(target_dir)?;

    for index in selected {
        let mut entry = archive.by_index(index)?;
        let full_name = entry.name().to_string();
        let relative = full_name.get(prefix.len()..).unwrap_or("");
        if relative.trim().is_empty() {
            continue;
        }

        let destination = resolve_entry_path(target_dir, relative)?;

        if full_name.ends_with('/') {
            fs::create_dir_all(&destination)?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&destination)?;
        io::copy(&mut entry, &mut output)?;
    }

    Ok(())
}

/// Join an archive-relative entry path onto the target directory, rejecting
/// components that would escape it.
fn resolve_entry_path(target_dir: &Path, relative: &str) -> Result<PathBuf> {
    let mut destination = target_dir.to_path_buf();
    for part in relative.split('/').filter(|part| !part.is_empty()) {
        if part == ".." {
            return Err(AppbakError::validation(format!(
                "archive entry escapes target directory: {relative}"
            )));
        }
        destination.push(part);
    }
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn build_source_tree(root: &Path) {
        let program = root.join("Editor");
        fs::create_dir_all(program.join("profiles")).unwrap();
        fs::write(program.join("settings.json"), "{\"theme\":\"dark\"}").unwrap();
        fs::write(program.join("profiles").join("default.ini"), "[profile]").unwrap();
        fs::create_dir_all(root.join("Notes")).unwrap();
        fs::write(root.join("Notes").join("todo.txt"), "write tests").unwrap();
    }

    #[test]
    fn test_compress_produces_nonempty_archive() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        assert!(archive.exists());
        assert!(fs::metadata(&archive).unwrap().len() > 0);
    }

    #[test]
    fn test_compress_entries_are_relative() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive_path = dir.path().join("backup.zip");
        compress(&source, &archive_path).unwrap();

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut names = Vec::new();
        for index in 0..archive.len() {
            names.push(archive.by_index_raw(index).unwrap().name().to_string());
        }

        assert!(names.contains(&"Editor/settings.json".to_string()));
        assert!(names.contains(&"Notes/todo.txt".to_string()));
        // no enclosing "staging/" root segment
        assert!(names.iter().all(|name| !name.starts_with("staging")));
    }

    #[test]
    fn test_compress_overwrites_existing_archive() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("file.txt"), "data").unwrap();

        let archive = dir.path().join("backup.zip");
        fs::write(&archive, "not a zip at all").unwrap();

        compress(&source, &archive).unwrap();

        // the stale file was replaced with a readable archive
        let opened = ZipArchive::new(File::open(&archive).unwrap());
        assert!(opened.is_ok());
    }

    #[test]
    fn test_extract_folder_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        let target = dir.path().join("restored");
        extract_folder(&archive, "Editor", &target).unwrap();

        assert_eq!(
            fs::read_to_string(target.join("settings.json")).unwrap(),
            "{\"theme\":\"dark\"}"
        );
        assert_eq!(
            fs::read_to_string(target.join("profiles").join("default.ini")).unwrap(),
            "[profile]"
        );
        // entries from the other program stay out
        assert!(!target.join("todo.txt").exists());
    }

    #[test]
    fn test_extract_folder_case_insensitive_prefix() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        let target = dir.path().join("restored");
        extract_folder(&archive, "editor", &target).unwrap();

        assert!(target.join("settings.json").exists());
    }

    #[test]
    fn test_extract_folder_no_data() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        let target = dir.path().join("restored");
        let result = extract_folder(&archive, "DoesNotExist", &target);

        match result {
            Err(AppbakError::NoArchiveData { folder }) => assert_eq!(folder, "DoesNotExist"),
            other => panic!("Expected NoArchiveData, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_folder_overwrites_existing_files() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        build_source_tree(&source);

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        let target = dir.path().join("restored");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("settings.json"), "stale").unwrap();

        extract_folder(&archive, "Editor", &target).unwrap();

        assert_eq!(
            fs::read_to_string(target.join("settings.json")).unwrap(),
            "{\"theme\":\"dark\"}"
        );
    }

    #[test]
    fn test_extract_folder_preserves_empty_directories() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(source.join("App").join("cache")).unwrap();
        fs::write(source.join("App").join("data.bin"), "bytes").unwrap();

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        let target = dir.path().join("restored");
        extract_folder(&archive, "App", &target).unwrap();

        assert!(target.join("cache").is_dir());
        assert!(target.join("data.bin").is_file());
    }

    #[test]
    fn test_extract_missing_archive_fails() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("missing.zip");
        let target = dir.path().join("restored");

        match extract_folder(&archive, "App", &target) {
            Err(AppbakError::ArchiveNotFound { path }) => assert_eq!(path, archive),
            other => panic!("Expected ArchiveNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_entry_path_rejects_traversal() {
        let dir = tempdir().unwrap();

        assert!(resolve_entry_path(dir.path(), "ok/inner.txt").is_ok());
        assert!(resolve_entry_path(dir.path(), "../outside.txt").is_err());
        assert!(resolve_entry_path(dir.path(), "ok/../../outside.txt").is_err());
    }

    #[test]
    fn test_compress_empty_directory_still_produces_archive() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("staging");
        fs::create_dir_all(&source).unwrap();

        let archive = dir.path().join("backup.zip");
        compress(&source, &archive).unwrap();

        assert!(fs::metadata(&archive).unwrap().len() > 0);
    }
}
