use crate::config::{BackupConfig, ProgramEntry};
use crate::copy::ItemCopyOutcome;
use crate::report::{LogLevel, RunObserver};
use crate::{archive, copy, naming, resolve, utils};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one backup run.
#[derive(Debug, Default)]
pub struct BackupRunResult {
    pub aborted: bool,
    pub backup_root_path: Option<PathBuf>,
    pub backup_path: Option<PathBuf>,
    pub zip_path: Option<PathBuf>,
    pub success_count: usize,
    pub total_programs: usize,
    pub failed_programs: Vec<String>,
}

impl BackupRunResult {
    pub fn summary(&self) -> String {
        if self.aborted {
            let failed = if self.failed_programs.is_empty() {
                String::new()
            } else {
                format!(" (failed: {})", self.failed_programs.join(", "))
            };
            format!(
                "Backup aborted: {}/{} programs backed up{failed}",
                self.success_count, self.total_programs
            )
        } else {
            let archive = self
                .zip_path
                .as_ref()
                .map(|path| format!(", archive: {}", path.display()))
                .unwrap_or_default();
            format!(
                "Backup finished: {}/{} programs{archive}",
                self.success_count, self.total_programs
            )
        }
    }
}

/// Back up the selected programs into a timestamped, compressed archive.
///
/// The run is all-or-nothing: the first program that cannot be resolved or
/// copied aborts the whole run, the working folder is deleted, and no
/// archive is produced. Operational failures are logged through the
/// observer and folded into the returned result; this function does not
/// return errors.
pub fn run_backup(
    config: &BackupConfig,
    programs: &[ProgramEntry],
    observer: &mut dyn RunObserver,
) -> BackupRunResult {
    let mut result = BackupRunResult {
        total_programs: programs.len(),
        ..Default::default()
    };

    let backup_root = resolve::expand_env(&config.backup_root_path);
    if backup_root.is_empty() {
        observer.log("Backup root path is empty.", LogLevel::Error);
        result.aborted = true;
        return result;
    }

    let backup_root = PathBuf::from(backup_root);
    let timestamp = naming::run_timestamp();
    let working_dir = backup_root.join(naming::working_folder_name(&timestamp));
    let zip_path = naming::archive_path_for(&working_dir);

    result.backup_root_path = Some(backup_root.clone());
    result.backup_path = Some(working_dir.clone());
    result.zip_path = Some(zip_path.clone());

    if !ensure_directory(&backup_root, "Backup root", observer) {
        result.aborted = true;
        return result;
    }
    if !ensure_directory(&working_dir, "Working folder", observer) {
        result.aborted = true;
        return result;
    }

    observer.log("Backup started.", LogLevel::Info);
    observer.log(
        &format!("Target: {}", working_dir.display()),
        LogLevel::Info,
    );

    observer.set_progress_max(programs.len());
    observer.log(
        &format!("Backing up {} programs.", programs.len()),
        LogLevel::Info,
    );

    let mut success_count = 0;
    let mut failed_programs: Vec<String> = Vec::new();

    for program in programs {
        let program_name = if program.name.trim().is_empty() {
            "(unnamed)".to_string()
        } else {
            program.name.clone()
        };

        observer.log(&format!("Processing: {program_name}"), LogLevel::Info);

        let found_path = match locate_program(program, observer) {
            Some(path) => path,
            None => {
                observer.log(&format!("  {program_name} not found."), LogLevel::Error);
                if !program.path.trim().is_empty() {
                    observer.log(
                        &format!("    Configured path: {}", program.path),
                        LogLevel::Error,
                    );
                }
                if !program.alternate_paths.is_empty() {
                    observer.log(
                        &format!("    Alternate paths: {}", program.alternate_paths.join(", ")),
                        LogLevel::Error,
                    );
                }
                failed_programs.push(program_name);
                observer.tick();
                cleanup_working_dir(&working_dir);
                result.aborted = true;
                result.success_count = success_count;
                result.failed_programs = failed_programs;
                return result;
            }
        };

        let destination = working_dir.join(naming::sanitize_name(&program_name));
        let backed_up = if program.is_selective() {
            observer.log(
                &format!("  Selective ({} items)", program.items.len()),
                LogLevel::Info,
            );
            backup_selective(
                &found_path,
                &destination,
                &program_name,
                &program.items,
                observer,
            )
        } else {
            observer.log("  Full", LogLevel::Info);
            backup_full(&found_path, &destination, &program_name, observer)
        };

        if backed_up {
            success_count += 1;
        } else {
            failed_programs.push(program_name);
            observer.tick();
            cleanup_working_dir(&working_dir);
            result.aborted = true;
            result.success_count = success_count;
            result.failed_programs = failed_programs;
            return result;
        }

        observer.tick();
    }

    observer.log("Compressing backup...", LogLevel::Info);
    match archive::compress(&working_dir, &zip_path) {
        Ok(()) => {
            let zip_size = utils::calculate_size(&zip_path);
            observer.log(
                &format!(
                    "Archive created: {} ({})",
                    zip_path.display(),
                    utils::format_size(zip_size)
                ),
                LogLevel::Success,
            );
            match fs::remove_dir_all(&working_dir) {
                Ok(()) => observer.log("Working folder deleted.", LogLevel::Success),
                Err(err) => observer.log(
                    &format!("Working folder could not be deleted: {err}"),
                    LogLevel::Warning,
                ),
            }
        }
        Err(err) => {
            observer.log(&format!("Error while compressing: {err}"), LogLevel::Error);
            cleanup_working_dir(&working_dir);
            if zip_path.exists() {
                let _ = fs::remove_file(&zip_path);
            }
            result.aborted = true;
            result.success_count = success_count;
            result.failed_programs = failed_programs;
            return result;
        }
    }

    result.aborted = false;
    result.success_count = success_count;
    result.failed_programs = failed_programs;
    result
}

/// Resolve a program's source directory: primary path first, then the
/// alternates in list order.
fn locate_program(program: &ProgramEntry, observer: &mut dyn RunObserver) -> Option<PathBuf> {
    if let Some(path) = resolve::resolve_dir(&program.path) {
        observer.log(&format!("  Path ok: {}", path.display()), LogLevel::Info);
        return Some(path);
    }

    if !program.alternate_paths.is_empty() {
        observer.log(
            "  Primary path missing, trying alternates...",
            LogLevel::Warning,
        );
        for alternate in &program.alternate_paths {
            if let Some(path) = resolve::resolve_dir(alternate) {
                observer.log(&format!("  Alternate ok: {}", path.display()), LogLevel::Info);
                return Some(path);
            }
        }
    }

    None
}

fn ensure_directory(path: &Path, label: &str, observer: &mut dyn RunObserver) -> bool {
    match fs::create_dir_all(path) {
        Ok(()) => {
            observer.log(
                &format!("{label} ready: {}", path.display()),
                LogLevel::Success,
            );
            true
        }
        Err(err) => {
            observer.log(
                &format!("{label} could not be created: {err}"),
                LogLevel::Error,
            );
            observer.log(&format!("Path: {}", path.display()), LogLevel::Error);
            false
        }
    }
}

/// Best-effort removal of the working folder. Its own failure is ignored;
/// there is nothing more to do with it.
fn cleanup_working_dir(path: &Path) {
    if path.is_dir() {
        let _ = fs::remove_dir_all(path);
    }
}

/// Copy the configured items of a selective program.
///
/// The program succeeds iff at least one item copied; individual items that
/// fail are recorded and logged as warnings.
fn backup_selective(
    source_base: &Path,
    destination: &Path,
    program_name: &str,
    items: &[String],
    observer: &mut dyn RunObserver,
) -> bool {
    if let Err(err) = fs::create_dir_all(destination) {
        observer.log(
            &format!("  Error backing up {program_name}: {err}"),
            LogLevel::Error,
        );
        return false;
    }

    observer.log(&format!("Backing up {program_name}..."), LogLevel::Info);

    let mut copied_items = 0;
    let mut failed_items: Vec<String> = Vec::new();
    let mut total_size = 0u64;

    for item in items {
        match copy::copy_configured_item(source_base, destination, item) {
            Ok(ItemCopyOutcome::CopiedWildcard { matches, size }) => {
                copied_items += 1;
                total_size += size;
                observer.log(
                    &format!("    OK: '{item}' ({matches} matches)"),
                    LogLevel::Success,
                );
            }
            Ok(ItemCopyOutcome::CopiedLiteral { size }) => {
                copied_items += 1;
                total_size += size;
                observer.log(&format!("    OK: '{item}'"), LogLevel::Success);
            }
            Ok(ItemCopyOutcome::NoMatches) => {
                observer.log(
                    &format!("    Warning: no matches for '{item}'"),
                    LogLevel::Warning,
                );
                failed_items.push(item.clone());
            }
            Ok(ItemCopyOutcome::Missing) => {
                observer.log(
                    &format!("    Warning: item missing: {item}"),
                    LogLevel::Warning,
                );
                failed_items.push(item.clone());
            }
            Err(err) => {
                observer.log(
                    &format!("    Warning: error at '{item}': {err}"),
                    LogLevel::Warning,
                );
                failed_items.push(item.clone());
            }
        }
    }

    if copied_items > 0 {
        observer.log(
            &format!(
                "  OK: {program_name} ({copied_items}/{} items, {})",
                items.len(),
                utils::format_size(total_size)
            ),
            LogLevel::Success,
        );
        if !failed_items.is_empty() {
            observer.log(
                &format!("    Failed: {}", failed_items.join(", ")),
                LogLevel::Warning,
            );
        }
        return true;
    }

    observer.log("  Error: no files backed up", LogLevel::Error);
    if !failed_items.is_empty() {
        observer.log(
            &format!("    Failed: {}", failed_items.join(", ")),
            LogLevel::Error,
        );
    }
    false
}

/// Copy a program's entire source tree.
fn backup_full(
    source: &Path,
    destination: &Path,
    program_name: &str,
    observer: &mut dyn RunObserver,
) -> bool {
    observer.log(&format!("Backing up {program_name} (full)..."), LogLevel::Info);

    match copy::copy_directory_contents(source, destination) {
        Ok(()) => {
            let size = utils::calculate_size(destination);
            let files = utils::count_files(destination);
            observer.log(
                &format!(
                    "  OK: {program_name} ({files} files, {})",
                    utils::format_size(size)
                ),
                LogLevel::Success,
            );
            true
        }
        Err(err) => {
            observer.log(
                &format!("  Error backing up {program_name}: {err}"),
                LogLevel::Error,
            );
            observer.log(
                &format!("    Source path: {}", source.display()),
                LogLevel::Error,
            );
            false
        }
    }
}
