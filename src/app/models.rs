use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Fragments excluded from every fresh descriptor.
pub const DEFAULT_DENYLIST: [&str; 3] = [".zip", "__pycache__", ".vscode"];

/// One folder (or file) requested for backup, paired with the name its archives carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub source_path: PathBuf,
    pub display_name: String,
}

/// Per-target descriptor persisted as `<save>/cache/<name>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub allowlist: BTreeSet<String>,
    #[serde(default)]
    pub denylist: BTreeSet<String>,
    #[serde(default = "default_auto_clean")]
    pub auto_clean: bool,
}

fn default_auto_clean() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            allowlist: BTreeSet::new(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            auto_clean: true,
        }
    }
}

impl BackupConfig {
    /// Built-in filters used by `--force`; auto-clean stays off.
    pub fn forced() -> Self {
        Self {
            auto_clean: false,
            ..Self::default()
        }
    }
}

/// Run-wide settings, built once at startup and shared by every target.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backup_root: PathBuf,
    pub force: bool,
    pub dateless: bool,
    pub preview: bool,
    pub today: NaiveDate,
}

impl Settings {
    pub fn cache_dir(&self) -> PathBuf {
        self.backup_root.join("cache")
    }

    /// `<name>.zip` in dateless mode, `<YYYY-MM-DD>-<name>.zip` otherwise.
    pub fn archive_file_name(&self, display_name: &str) -> String {
        if self.dateless {
            format!("{}.zip", display_name)
        } else {
            format!("{}-{}.zip", self.today.format("%Y-%m-%d"), display_name)
        }
    }

    pub fn archive_path(&self, display_name: &str) -> PathBuf {
        self.backup_root.join(self.archive_file_name(display_name))
    }

    /// Retention runs only for dated archives whose descriptor asks for it.
    pub fn runs_retention(&self, config: &BackupConfig) -> bool {
        config.auto_clean && !self.dateless
    }
}

/// A single entry discovered under a target's source path.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path inside the archive, `/`-separated, directories without trailing slash.
    pub relative_path: String,
    pub depth: usize,
    pub is_dir: bool,
    pub size: u64,
}

/// What a finished archive run produced.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub entries: usize,
    pub input_bytes: u64,
    pub archive_bytes: u64,
    pub max_depth: usize,
}

impl ArchiveReport {
    pub fn deflate_percent(&self) -> f64 {
        deflate_percent(self.input_bytes, self.archive_bytes)
    }
}

/// Space saved by compression, in percent of the original size.
pub fn deflate_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}
