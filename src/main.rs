use appbak::{
    AppbakError, BackupConfig, ConsoleObserver, ProgramEntry, RestoreSelection,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process;

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(error) => {
            eprintln!("Error: {error}");

            // Show suggestions if available
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\nSuggestions:");
                for suggestion in suggestions {
                    eprintln!("  - {suggestion}");
                }
            }

            process::exit(error.exit_code());
        }
    }
}

fn run() -> Result<i32, AppbakError> {
    let matches = Command::new("appbak")
        .version("0.1.0")
        .about("Config-driven backup and restore for application data directories")
        .long_about(
            "appbak backs up a configured set of application data directories\n\
             into a timestamped zip archive and restores them later.\n\
             Example: appbak backup --config config.json",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .help("Suppress all output except errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .conflicts_with("quiet")
                .help("Show detailed result information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("backup")
                .about("Back up the configured programs into a new archive")
                .arg(config_arg())
                .arg(programs_arg()),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore programs from a backup archive")
                .arg(config_arg())
                .arg(programs_arg())
                .arg(
                    Arg::new("archive")
                        .short('a')
                        .long("archive")
                        .required(true)
                        .value_name("ZIP")
                        .help("Backup archive to restore from"),
                )
                .arg(
                    Arg::new("pre-backup")
                        .long("pre-backup")
                        .help("Save a safety copy of each existing target before overwriting it")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List configured programs and whether their paths resolve")
                .arg(config_arg()),
        )
        .get_matches();

    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_flag("verbose");

    match matches.subcommand() {
        Some(("backup", sub)) => backup_command(sub, quiet, verbose),
        Some(("restore", sub)) => restore_command(sub, quiet, verbose),
        Some(("list", sub)) => list_command(sub),
        _ => unreachable!("subcommand is required"),
    }
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .default_value("config.json")
        .help("Configuration file")
}

fn programs_arg() -> Arg {
    Arg::new("programs")
        .short('p')
        .long("programs")
        .value_name("NAME")
        .value_delimiter(',')
        .num_args(1..)
        .help("Program names to process (default: all configured programs)")
}

fn load_run_config(matches: &ArgMatches) -> Result<BackupConfig, AppbakError> {
    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let config = appbak::load_config(&config_path)?;
    if config.programs.is_empty() {
        return Err(AppbakError::config("No programs in the configuration."));
    }
    Ok(config)
}

fn requested_names(matches: &ArgMatches) -> Option<Vec<String>> {
    matches
        .get_many::<String>("programs")
        .map(|values| values.cloned().collect())
}

/// Resolve requested names against the configuration, keeping config order
/// for "all". Unknown names fail the run before any I/O happens.
fn select_programs(
    config: &BackupConfig,
    names: Option<Vec<String>>,
) -> Result<Vec<ProgramEntry>, AppbakError> {
    match names {
        None => Ok(config.programs.clone()),
        Some(names) => {
            let mut selected = Vec::new();
            for name in names {
                match config.find_program(&name) {
                    Some(program) => selected.push(program.clone()),
                    None => return Err(AppbakError::ProgramNotFound { name }),
                }
            }
            Ok(selected)
        }
    }
}

fn backup_command(matches: &ArgMatches, quiet: bool, verbose: bool) -> Result<i32, AppbakError> {
    let config = load_run_config(matches)?;
    let selected = select_programs(&config, requested_names(matches))?;
    if selected.is_empty() {
        return Err(AppbakError::validation("No program selected."));
    }

    let mut observer = ConsoleObserver::new(quiet);
    let result = appbak::run_backup(&config, &selected, &mut observer);
    let errored = observer.errored();
    observer.finish();

    if verbose {
        if let Some(root) = &result.backup_root_path {
            println!("Backup root: {}", root.display());
        }
        if let Some(zip) = &result.zip_path {
            println!("Archive: {}", zip.display());
        }
    }

    if !quiet || result.aborted {
        println!("{}", result.summary());
    }

    Ok(if result.aborted || errored { 1 } else { 0 })
}

fn restore_command(matches: &ArgMatches, quiet: bool, verbose: bool) -> Result<i32, AppbakError> {
    let config = load_run_config(matches)?;
    let selected = select_programs(&config, requested_names(matches))?;
    if selected.is_empty() {
        return Err(AppbakError::validation("No program selected."));
    }

    let archive_path = matches
        .get_one::<String>("archive")
        .map(PathBuf::from)
        .ok_or_else(|| AppbakError::validation("No archive specified."))?;
    let create_pre_backup = matches.get_flag("pre-backup");

    let selections: Vec<RestoreSelection> = selected
        .iter()
        .map(RestoreSelection::for_program)
        .collect();

    let mut observer = ConsoleObserver::new(quiet);
    let result = appbak::run_restore(
        &config,
        &selections,
        &archive_path,
        create_pre_backup,
        &mut observer,
    );
    let errored = observer.errored();
    observer.finish();

    if verbose {
        if let Some(pre) = &result.pre_backup_path {
            println!("Pre-backup folder: {}", pre.display());
        }
        if let Some(pre_zip) = &result.pre_backup_zip_path {
            println!("Pre-backup archive: {}", pre_zip.display());
        }
    }

    if !quiet || result.aborted {
        println!("{}", result.summary());
    }

    Ok(if result.aborted || errored { 1 } else { 0 })
}

fn list_command(matches: &ArgMatches) -> Result<i32, AppbakError> {
    let config = load_run_config(matches)?;

    for program in &config.programs {
        let mode = if program.is_selective() {
            format!("selective, {} items", program.items.len())
        } else {
            "full".to_string()
        };

        match appbak::resolve::resolve_with_alternates(&program.path, &program.alternate_paths) {
            Some(path) => println!("{} ({mode}) -> {}", program.name, path.display()),
            None => println!("{} ({mode}) -> not found", program.name),
        }
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BackupConfig {
        appbak::parse_config(
            r#"{
                "backupRootPath": "/backups",
                "programsToBackup": [
                    {"name": "Editor", "path": "/data/editor"},
                    {"name": "Notes", "path": "/data/notes"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_select_programs_all_by_default() {
        let config = sample_config();
        let selected = select_programs(&config, None).unwrap();

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].name, "Editor");
        assert_eq!(selected[1].name, "Notes");
    }

    #[test]
    fn test_select_programs_by_name() {
        let config = sample_config();
        let selected = select_programs(&config, Some(vec!["notes".to_string()])).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Notes");
    }

    #[test]
    fn test_select_programs_unknown_name() {
        let config = sample_config();
        let result = select_programs(&config, Some(vec!["Ghost".to_string()]));

        match result {
            Err(AppbakError::ProgramNotFound { name }) => assert_eq!(name, "Ghost"),
            other => panic!("Expected ProgramNotFound, got {other:?}"),
        }
    }
}
