use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a single target; sibling targets keep running.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Failed to read config {0}: {1}")]
    ConfigRead(PathBuf, #[source] io::Error),
    #[error("Malformed config {0}: {1}")]
    ConfigParse(PathBuf, #[source] serde_json::Error),
    #[error("Failed to write config {0}: {1}")]
    ConfigWrite(PathBuf, #[source] io::Error),
    #[error("Source path not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Failed to read {0}: {1}")]
    SourceRead(PathBuf, #[source] io::Error),
    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, #[source] io::Error),
    #[error("Failed to build archive {0}: {1}")]
    Archive(PathBuf, #[source] zip::result::ZipError),
}

impl BackupError {
    /// Short kind label used in the per-target error stream.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigRead(..) | Self::ConfigParse(..) | Self::ConfigWrite(..) => "config",
            Self::SourceNotFound(..) | Self::SourceRead(..) => "source",
            Self::Write(..) | Self::Archive(..) => "write",
        }
    }
}
