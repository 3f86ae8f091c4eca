use crate::error::AppbakError;
use crate::{matcher, utils, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Outcome of copying one configured selective item.
pub enum ItemCopyOutcome {
    CopiedWildcard { matches: usize, size: u64 },
    CopiedLiteral { size: u64 },
    NoMatches,
    Missing,
}

/// Copy one configured selective item into `destination`.
///
/// A wildcard item copies every match, preserving each match's path
/// relative to `source_base`; a literal item copies the named file or
/// directory. Reports zero matches and missing literals as outcomes rather
/// than errors so the caller can decide how severe they are.
pub fn copy_configured_item(
    source_base: &Path,
    destination: &Path,
    item: &str,
) -> Result<ItemCopyOutcome> {
    if matcher::contains_wildcard(item) {
        let matches = matcher::find_matches(source_base, item)?;
        if matches.is_empty() {
            return Ok(ItemCopyOutcome::NoMatches);
        }

        let mut size = 0u64;
        for found in &matches {
            let relative = found.strip_prefix(source_base).map_err(|_| {
                AppbakError::validation(format!(
                    "{} is not under {}",
                    found.display(),
                    source_base.display()
                ))
            })?;
            let dest_path = destination.join(relative);
            copy_item(found, &dest_path)?;
            size += utils::calculate_size(&dest_path);
        }

        return Ok(ItemCopyOutcome::CopiedWildcard {
            matches: matches.len(),
            size,
        });
    }

    let source_path = source_base.join(item);
    if source_path.is_file() || source_path.is_dir() {
        let dest_path = destination.join(item);
        copy_item(&source_path, &dest_path)?;
        Ok(ItemCopyOutcome::CopiedLiteral {
            size: utils::calculate_size(&dest_path),
        })
    } else {
        Ok(ItemCopyOutcome::Missing)
    }
}

/// Copy a single item, file or directory tree, to `destination`.
///
/// Files overwrite an existing destination; directories are mirrored
/// recursively. A source that is neither (vanished between enumeration and
/// copy) is a no-op.
pub fn copy_item(source: &Path, destination: &Path) -> Result<()> {
    if source.is_file() {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        return Ok(());
    }

    if source.is_dir() {
        copy_directory_contents(source, destination)?;
    }

    Ok(())
}

/// Recursively mirror `source` into `destination`.
///
/// Recreates the full subdirectory structure, including empty directories,
/// and copies every file, overwriting existing destination files. Existing
/// destination content outside the copied relative paths is left alone.
/// A failure mid-tree leaves whatever was already copied in place; the
/// caller decides whether to discard the enclosing folder.
pub fn copy_directory_contents(source: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            AppbakError::validation(format!(
                "{} is not under {}",
                entry.path().display(),
                source.display()
            ))
        })?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
        // Symlinks and other special entries are skipped.
    }

    Ok(())
}
