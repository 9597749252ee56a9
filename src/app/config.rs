use crate::app::error::BackupError;
use crate::app::models::BackupConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of looking up a target's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedConfig {
    /// Read from an existing descriptor file.
    Existing(BackupConfig),
    /// No descriptor existed; defaults were written to disk.
    Created(BackupConfig),
    /// No descriptor existed and the store is read-only; defaults are in memory only.
    Defaulted(BackupConfig),
}

impl LoadedConfig {
    pub fn config(&self) -> &BackupConfig {
        match self {
            Self::Existing(c) | Self::Created(c) | Self::Defaulted(c) => c,
        }
    }
}

/// Reads and writes the per-target JSON descriptors under `<save>/cache`.
pub struct ConfigStore {
    cache_dir: PathBuf,
    read_only: bool,
}

impl ConfigStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            read_only: false,
        }
    }

    /// A store that never creates files, used by preview runs.
    pub fn read_only(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            read_only: true,
        }
    }

    pub fn path_for(&self, display_name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", display_name))
    }

    pub fn load(&self, display_name: &str) -> Result<LoadedConfig, BackupError> {
        let path = self.path_for(display_name);

        if !path.exists() {
            let config = BackupConfig::default();
            if self.read_only {
                return Ok(LoadedConfig::Defaulted(config));
            }
            self.save(&path, &config)?;
            return Ok(LoadedConfig::Created(config));
        }

        let content =
            fs::read_to_string(&path).map_err(|e| BackupError::ConfigRead(path.clone(), e))?;
        let config: BackupConfig =
            serde_json::from_str(&content).map_err(|e| BackupError::ConfigParse(path, e))?;

        Ok(LoadedConfig::Existing(config))
    }

    fn save(&self, path: &Path, config: &BackupConfig) -> Result<(), BackupError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| BackupError::ConfigWrite(self.cache_dir.clone(), e))?;
        let mut json = serde_json::to_string_pretty(config)
            .map_err(|e| BackupError::ConfigWrite(path.to_path_buf(), e.into()))?;
        json.push('\n');
        fs::write(path, json).map_err(|e| BackupError::ConfigWrite(path.to_path_buf(), e))
    }
}
