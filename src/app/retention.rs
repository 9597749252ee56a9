use crate::app::error::BackupError;
use crate::app::formatter::OutputGenerator;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Splits `YYYY-MM-DD-<name>.zip` into its date and name.
pub fn parse_dated_archive(file_name: &str) -> Option<(NaiveDate, &str)> {
    let stem = file_name.strip_suffix(".zip")?;
    let date = stem.get(..10)?;
    let name = stem.get(10..)?.strip_prefix('-')?;
    if name.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, name))
}

/// Keeps the newest archive of each calendar month and returns the rest, oldest first.
pub fn plan_deletions(archives: &[(NaiveDate, PathBuf)]) -> Vec<PathBuf> {
    let mut months: BTreeMap<(i32, u32), Vec<&(NaiveDate, PathBuf)>> = BTreeMap::new();
    for archive in archives {
        months
            .entry((archive.0.year(), archive.0.month()))
            .or_default()
            .push(archive);
    }

    let mut doomed: Vec<&(NaiveDate, PathBuf)> = Vec::new();
    for mut group in months.into_values() {
        group.sort();
        group.pop();
        doomed.extend(group);
    }

    doomed.sort();
    doomed.into_iter().map(|(_, path)| path.clone()).collect()
}

/// Prunes dated archives so each month keeps only its latest one.
pub struct RetentionManager<'a> {
    backup_root: &'a Path,
    preview: bool,
    pending: Option<(NaiveDate, PathBuf)>,
}

impl<'a> RetentionManager<'a> {
    pub fn new(backup_root: &'a Path, preview: bool) -> Self {
        Self {
            backup_root,
            preview,
            pending: None,
        }
    }

    /// Counts an archive that a preview run would have written as already present.
    pub fn with_pending(mut self, date: NaiveDate, path: PathBuf) -> Self {
        self.pending = Some((date, path));
        self
    }

    /// Returns the archives deleted, or in preview mode the ones that would be.
    pub fn clean(&self, display_name: &str) -> Result<Vec<PathBuf>, BackupError> {
        let mut archives = self.find_archives(display_name)?;
        if let Some(pending) = &self.pending {
            if !archives.iter().any(|(_, path)| *path == pending.1) {
                archives.push(pending.clone());
            }
        }
        let deletions = plan_deletions(&archives);

        if self.preview {
            print!("{}", OutputGenerator::format_deletion_plan(display_name, &deletions));
            return Ok(deletions);
        }

        for path in &deletions {
            fs::remove_file(path).map_err(|e| BackupError::Write(path.clone(), e))?;
            log::info!("[{}] auto_clean deleted {}", display_name, path.display());
        }

        Ok(deletions)
    }

    fn find_archives(&self, display_name: &str) -> Result<Vec<(NaiveDate, PathBuf)>, BackupError> {
        if !self.backup_root.is_dir() {
            return Ok(Vec::new());
        }

        let read_err = |e| BackupError::Write(self.backup_root.to_path_buf(), e);
        let mut archives = Vec::new();

        for entry in fs::read_dir(self.backup_root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some((date, name)) = parse_dated_archive(file_name) {
                if name == display_name {
                    archives.push((date, path));
                }
            }
        }

        Ok(archives)
    }
}
