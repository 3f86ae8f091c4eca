use chrono::Local;
use std::path::{Path, PathBuf};

/// Fixed prefix for every artifact this tool writes.
pub const BACKUP_PREFIX: &str = "appbak";

/// Characters that are invalid in a filesystem entry name on at least one
/// supported platform. Matches the set used for destination folder names.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Placeholder substituted for invalid characters.
const PLACEHOLDER: char = '-';

/// Current local time at second resolution, as used in artifact names.
pub fn run_timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Name of the uncompressed working folder for a backup run.
pub fn working_folder_name(timestamp: &str) -> String {
    format!("{BACKUP_PREFIX}_{timestamp}")
}

/// Name of the safety-copy folder written before a restore run.
pub fn pre_backup_folder_name(timestamp: &str) -> String {
    format!("{BACKUP_PREFIX}_restore_before_{timestamp}")
}

/// Archive path for a working folder: the folder path plus `.zip`.
pub fn archive_path_for(folder: &Path) -> PathBuf {
    let mut name = folder.as_os_str().to_os_string();
    name.push(".zip");
    PathBuf::from(name)
}

/// Replace every character invalid in a filesystem entry name with a fixed
/// placeholder. Program names become destination folder names through this.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if INVALID_NAME_CHARS.contains(&ch) || ch.is_control() {
                PLACEHOLDER
            } else {
                ch
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_folder_name() {
        let name = working_folder_name("2025-01-01_12-00-00");
        assert_eq!(name, "appbak_2025-01-01_12-00-00");
    }

    #[test]
    fn test_pre_backup_folder_name() {
        let name = pre_backup_folder_name("2025-01-01_12-00-00");
        assert_eq!(name, "appbak_restore_before_2025-01-01_12-00-00");
    }

    #[test]
    fn test_run_timestamp_shape() {
        let ts = run_timestamp();
        // yyyy-MM-dd_HH-mm-ss
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "_");
        assert!(ts.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_'));
    }

    #[test]
    fn test_archive_path_for() {
        let folder = Path::new("/backups/appbak_2025-01-01_12-00-00");
        let archive = archive_path_for(folder);
        assert_eq!(
            archive,
            PathBuf::from("/backups/appbak_2025-01-01_12-00-00.zip")
        );
    }

    #[test]
    fn test_sanitize_name_passthrough() {
        assert_eq!(sanitize_name("Firefox"), "Firefox");
        assert_eq!(sanitize_name("Visual Studio Code"), "Visual Studio Code");
        assert_eq!(sanitize_name("müller-tool_2"), "müller-tool_2");
    }

    #[test]
    fn test_sanitize_name_invalid_chars() {
        assert_eq!(sanitize_name("a/b"), "a-b");
        assert_eq!(sanitize_name("a\\b"), "a-b");
        assert_eq!(sanitize_name("we:ird<name>?"), "we-ird-name--");
        assert_eq!(sanitize_name("pipe|star*quote\""), "pipe-star-quote-");
    }

    #[test]
    fn test_sanitize_name_control_chars() {
        assert_eq!(sanitize_name("tab\there"), "tab-here");
        assert_eq!(sanitize_name("nl\nhere"), "nl-here");
    }

    #[test]
    fn test_sanitize_name_empty() {
        assert_eq!(sanitize_name(""), "");
    }
}
