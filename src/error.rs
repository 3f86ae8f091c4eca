use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppbakError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Program not found: {name}")]
    ProgramNotFound { name: String },

    #[error("Archive not found: {path}")]
    ArchiveNotFound { path: PathBuf },

    #[error("Archive was not created: {path}")]
    ArchiveNotCreated { path: PathBuf },

    #[error("No data in archive for '{folder}'")]
    NoArchiveData { folder: String },

    #[error("Invalid wildcard pattern: {pattern}")]
    InvalidPattern { pattern: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl AppbakError {
    /// Create a configuration error with a custom message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error with a custom message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppbakError::Config { .. } => 2,
            AppbakError::Validation { .. } => 2,
            _ => 1,
        }
    }

    /// Provide helpful suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AppbakError::Config { .. } => vec![
                "Check that the configuration file exists and is valid JSON".to_string(),
                "Use --config to point at a different file".to_string(),
            ],
            AppbakError::ArchiveNotFound { .. } => vec![
                "Check the archive path for typos".to_string(),
                "Run a backup first to produce an archive".to_string(),
            ],
            AppbakError::NoArchiveData { folder } => vec![
                format!("Check that the archive contains a top-level folder '{folder}'"),
                "The folder name must match the sanitized program name".to_string(),
            ],
            _ => vec![],
        }
    }
}
