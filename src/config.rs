use crate::error::AppbakError;
use crate::Result;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration document, one per run. Read-only once loaded.
///
/// Property names accept both camelCase and PascalCase spellings; missing
/// fields fall back to empty defaults and are validated by the engine where
/// it uses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    #[serde(rename = "backupRootPath", alias = "BackupRootPath")]
    pub backup_root_path: String,
    #[serde(
        rename = "programsToBackup",
        alias = "ProgramsToBackup",
        alias = "programs"
    )]
    pub programs: Vec<ProgramEntry>,
}

impl BackupConfig {
    /// Look up a program by name, case-insensitive.
    ///
    /// Names are expected to be unique; when the configuration contains
    /// duplicates, the last entry with the name governs.
    pub fn find_program(&self, name: &str) -> Option<&ProgramEntry> {
        self.programs
            .iter()
            .rev()
            .find(|program| program.name.eq_ignore_ascii_case(name))
    }
}

/// One named unit of application data subject to backup/restore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramEntry {
    #[serde(rename = "name", alias = "Name")]
    pub name: String,
    #[serde(rename = "path", alias = "Path")]
    pub path: String,
    #[serde(rename = "type", alias = "Type")]
    pub mode: BackupMode,
    #[serde(rename = "items", alias = "Items")]
    pub items: Vec<String>,
    #[serde(rename = "alternatePaths", alias = "AlternatePaths")]
    pub alternate_paths: Vec<String>,
}

impl ProgramEntry {
    /// Selective requires a non-empty item list; anything else behaves as Full.
    pub fn is_selective(&self) -> bool {
        self.mode == BackupMode::Selective && !self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    #[default]
    Full,
    Selective,
}

impl Serialize for BackupMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            BackupMode::Full => "Full",
            BackupMode::Selective => "Selective",
        })
    }
}

impl<'de> Deserialize<'de> for BackupMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // "Selective" in any casing selects selective mode; every other
        // value, including null, behaves as Full.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(value) if value.eq_ignore_ascii_case("selective") => BackupMode::Selective,
            _ => BackupMode::Full,
        })
    }
}

/// Load a configuration document from disk.
pub fn load_config(path: &Path) -> Result<BackupConfig> {
    let json = fs::read_to_string(path).map_err(|err| {
        AppbakError::config(format!("Could not read {}: {err}", path.display()))
    })?;
    parse_config(&json)
}

/// Parse a configuration document from a JSON string.
pub fn parse_config(json: &str) -> Result<BackupConfig> {
    serde_json::from_str(json)
        .map_err(|err| AppbakError::config(format!("Could not parse configuration: {err}")))
}

/// Write a pretty-printed copy of the configuration into `dir` as
/// `config.json`. Used by the restore pre-backup for traceability.
pub fn save_config(dir: &Path, config: &BackupConfig) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|err| AppbakError::config(format!("Could not serialize configuration: {err}")))?;
    let path = dir.join("config.json");
    fs::write(&path, json)?;
    Ok(path)
}
