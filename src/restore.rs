use crate::config::{self, BackupConfig, ProgramEntry};
use crate::copy::ItemCopyOutcome;
use crate::report::{LogLevel, RunObserver};
use crate::{archive, copy, naming, resolve};
use std::fs;
use std::path::{Path, PathBuf};

/// Pairs an archive's top-level folder with the program describing where
/// and how to restore it.
#[derive(Debug, Clone)]
pub struct RestoreSelection {
    pub folder_name: String,
    pub program: ProgramEntry,
}

impl RestoreSelection {
    pub fn new(folder_name: impl Into<String>, program: ProgramEntry) -> Self {
        Self {
            folder_name: folder_name.into(),
            program,
        }
    }

    /// Selection for a program under its sanitized-name folder, the layout
    /// a backup run produces.
    pub fn for_program(program: &ProgramEntry) -> Self {
        Self {
            folder_name: naming::sanitize_name(&program.name),
            program: program.clone(),
        }
    }
}

/// Outcome of one restore run.
#[derive(Debug, Default)]
pub struct RestoreRunResult {
    pub aborted: bool,
    pub success_count: usize,
    pub total_programs: usize,
    pub backup_zip_path: Option<PathBuf>,
    pub pre_backup_path: Option<PathBuf>,
    pub pre_backup_zip_path: Option<PathBuf>,
    pub failed_programs: Vec<String>,
}

impl RestoreRunResult {
    pub fn summary(&self) -> String {
        let failed = if self.failed_programs.is_empty() {
            String::new()
        } else {
            format!(" (failed: {})", self.failed_programs.join(", "))
        };
        let pre = self
            .pre_backup_zip_path
            .as_ref()
            .map(|path| format!(", pre-backup: {}", path.display()))
            .unwrap_or_default();

        if self.aborted {
            format!(
                "Restore aborted: {}/{} selections restored{failed}",
                self.success_count, self.total_programs
            )
        } else {
            format!(
                "Restore finished: {}/{} selections{failed}{pre}",
                self.success_count, self.total_programs
            )
        }
    }
}

/// Restore the given selections from a backup archive.
///
/// Unlike backup, a failed selection is marked and skipped; the run only
/// counts as aborted when there were failures and zero successes. With
/// `create_pre_backup`, each existing target is snapshotted into a safety
/// folder before being overwritten; the folder is compressed at the end
/// and a compression failure is a warning only.
pub fn run_restore(
    config: &BackupConfig,
    selections: &[RestoreSelection],
    archive_path: &Path,
    create_pre_backup: bool,
    observer: &mut dyn RunObserver,
) -> RestoreRunResult {
    let mut result = RestoreRunResult {
        backup_zip_path: Some(archive_path.to_path_buf()),
        total_programs: selections.len(),
        ..Default::default()
    };

    if !archive_path.is_file() {
        observer.log("Backup archive not found.", LogLevel::Error);
        result.aborted = true;
        return result;
    }

    let mut pre_backup_path: Option<PathBuf> = None;
    if create_pre_backup {
        let root = resolve::expand_env(&config.backup_root_path);
        if root.is_empty() {
            observer.log("Backup root path is empty (pre-backup).", LogLevel::Error);
            result.aborted = true;
            return result;
        }

        let timestamp = naming::run_timestamp();
        let pre_path = PathBuf::from(root).join(naming::pre_backup_folder_name(&timestamp));
        if let Err(err) = fs::create_dir_all(&pre_path) {
            observer.log(
                &format!("Pre-backup folder could not be created: {err}"),
                LogLevel::Error,
            );
            result.aborted = true;
            return result;
        }

        result.pre_backup_path = Some(pre_path.clone());
        match config::save_config(&pre_path, config) {
            Ok(_) => observer.log("config.json saved into pre-backup.", LogLevel::Info),
            Err(err) => observer.log(
                &format!("Warning: config.json could not be saved into pre-backup: {err}"),
                LogLevel::Warning,
            ),
        }
        pre_backup_path = Some(pre_path);
    }

    observer.set_progress_max(selections.len());

    let mut success_count = 0;
    let mut failed: Vec<String> = Vec::new();

    for selection in selections {
        let program = &selection.program;
        let program_name = if program.name.trim().is_empty() {
            selection.folder_name.clone()
        } else {
            program.name.clone()
        };

        observer.log(&format!("Restore: {program_name}"), LogLevel::Info);

        let target = resolve::expand_env(&program.path);
        if target.is_empty() {
            observer.log(
                &format!("  Target path missing for {program_name}."),
                LogLevel::Error,
            );
            failed.push(program_name);
            observer.tick();
            continue;
        }
        let target_path = PathBuf::from(target);

        if let Some(pre_path) = &pre_backup_path {
            if target_path.exists() {
                let pre_dest = pre_path.join(naming::sanitize_name(&program_name));
                if !snapshot_current_data(program, &target_path, &pre_dest, observer) {
                    observer.log(
                        &format!("  Pre-backup failed for {program_name}."),
                        LogLevel::Error,
                    );
                    failed.push(program_name);
                    observer.tick();
                    continue;
                }
            }
        }

        match archive::extract_folder(archive_path, &selection.folder_name, &target_path) {
            Ok(()) => {
                observer.log("  OK: restore complete.", LogLevel::Success);
                success_count += 1;
            }
            Err(err) => {
                observer.log(&format!("  Restore failed: {err}"), LogLevel::Error);
                failed.push(program_name);
            }
        }

        observer.tick();
    }

    result.success_count = success_count;
    result.failed_programs = failed;
    result.aborted = !result.failed_programs.is_empty() && success_count == 0;

    if let Some(pre_path) = pre_backup_path {
        let pre_zip = naming::archive_path_for(&pre_path);
        match archive::compress(&pre_path, &pre_zip) {
            Ok(()) => {
                observer.log(
                    &format!("Pre-backup archive created: {}", pre_zip.display()),
                    LogLevel::Success,
                );
                result.pre_backup_zip_path = Some(pre_zip);
            }
            Err(err) => observer.log(
                &format!("Warning: pre-backup archive could not be created: {err}"),
                LogLevel::Warning,
            ),
        }
    }

    result
}

/// Snapshot a restore target's current state before it is overwritten,
/// selective or full depending on the program's configuration.
fn snapshot_current_data(
    program: &ProgramEntry,
    source: &Path,
    destination: &Path,
    observer: &mut dyn RunObserver,
) -> bool {
    if program.is_selective() {
        return snapshot_selective(source, destination, &program.items, observer);
    }

    match copy::copy_directory_contents(source, destination) {
        Ok(()) => {
            observer.log("  Pre-backup created.", LogLevel::Success);
            true
        }
        Err(err) => {
            observer.log(&format!("  Pre-backup failed: {err}"), LogLevel::Error);
            false
        }
    }
}

/// Selective snapshot of the configured items. Zero copied items is
/// reported as a warning but still counts as success.
fn snapshot_selective(
    source_base: &Path,
    destination: &Path,
    items: &[String],
    observer: &mut dyn RunObserver,
) -> bool {
    if let Err(err) = fs::create_dir_all(destination) {
        observer.log(&format!("  Pre-backup failed: {err}"), LogLevel::Error);
        return false;
    }

    let mut copied_items = 0;

    for item in items {
        match copy::copy_configured_item(source_base, destination, item) {
            Ok(ItemCopyOutcome::CopiedWildcard { .. }) | Ok(ItemCopyOutcome::CopiedLiteral { .. }) => {
                copied_items += 1;
            }
            Ok(ItemCopyOutcome::NoMatches) | Ok(ItemCopyOutcome::Missing) => {}
            Err(err) => observer.log(
                &format!("  Warning: pre-backup item '{item}' failed: {err}"),
                LogLevel::Warning,
            ),
        }
    }

    if copied_items > 0 {
        observer.log("  Pre-backup created.", LogLevel::Success);
    } else {
        observer.log("  Warning: pre-backup copied no files.", LogLevel::Warning);
    }
    true
}
