use crate::app::error::BackupError;
use crate::app::filter::Filter;
use crate::app::models::{BackupConfig, FileEntry};
use ignore::{DirEntry, WalkBuilder};
use pathdiff::diff_paths;
use std::path::{Path, PathBuf};

/// Walks a target's source path and keeps the entries the filter lets through.
pub struct Scanner {
    root: PathBuf,
    filter: Filter,
    skip: Option<PathBuf>,
}

impl Scanner {
    /// `skip` names a directory never to enter, normally the backup root.
    pub fn new(
        root: &Path,
        config: &BackupConfig,
        skip: Option<PathBuf>,
    ) -> Result<Self, BackupError> {
        let root = root
            .canonicalize()
            .map_err(|_| BackupError::SourceNotFound(root.to_path_buf()))?;
        let skip = skip.and_then(|p| p.canonicalize().ok());

        Ok(Self {
            root,
            filter: Filter::new(config),
            skip,
        })
    }

    pub fn scan(&self) -> Vec<FileEntry> {
        if self.root.is_file() {
            return self.scan_single_file().into_iter().collect();
        }

        let mut entries = Vec::new();

        let prune_root = self.root.clone();
        let prune_filter = self.filter.clone();
        let prune_skip = self.skip.clone();

        // Everything is archived: no ignore files, no hidden-file filtering.
        // Linked folders are walked; the walker reports symlink loops as errors.
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let path = entry.path();
                if prune_skip.as_deref() == Some(path) {
                    return false;
                }
                match candidate_path(path, &prune_root, is_dir(entry)) {
                    Some(candidate) => !prune_filter.denies(&candidate),
                    None => true,
                }
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    if let Some(processed) = self.process_entry(&entry) {
                        entries.push(processed);
                    }
                }
                Err(err) => log::warn!("Error walking entry: {}", err),
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    fn scan_single_file(&self) -> Option<FileEntry> {
        let name = self.root.file_name()?.to_string_lossy().to_string();
        if !self.filter.include(&name) {
            return None;
        }

        Some(FileEntry {
            path: self.root.clone(),
            relative_path: name,
            depth: 1,
            is_dir: false,
            size: file_size(&self.root),
        })
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<FileEntry> {
        let path = entry.path();
        if path == self.root {
            return None;
        }

        let is_dir = is_dir(entry);
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        if !is_dir && !is_file {
            log::debug!("Skipping special file {}", path.display());
            return None;
        }

        let candidate = candidate_path(path, &self.root, is_dir)?;
        if !self.filter.include(&candidate) {
            return None;
        }

        let relative_path = candidate.trim_end_matches('/').to_string();
        let depth = relative_path.split('/').count();

        Some(FileEntry {
            path: path.to_path_buf(),
            relative_path,
            depth,
            is_dir,
            size: if is_dir { 0 } else { file_size(path) },
        })
    }
}

/// Type of the entry itself, or of its target when it is a followed link.
fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_dir())
}

/// `/`-joined path relative to `root`, with a trailing `/` for directories.
fn candidate_path(path: &Path, root: &Path, is_dir: bool) -> Option<String> {
    let relative = diff_paths(path, root)?;
    if relative.as_os_str().is_empty() {
        return None;
    }

    let mut joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if is_dir {
        joined.push('/');
    }
    Some(joined)
}

fn file_size(path: &Path) -> u64 {
    path.metadata().map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src/__pycache__")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("README.md"), "readme").unwrap();
        fs::write(root.join("src/main.py"), "print()").unwrap();
        fs::write(root.join("src/__pycache__/main.pyc"), "bytes").unwrap();
        fs::write(root.join("old.zip"), "zip").unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        tmp
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.relative_path.as_str()).collect()
    }

    #[test]
    fn default_denylist_prunes_caches_and_archives() {
        let tmp = tree();
        let scanner = Scanner::new(tmp.path(), &BackupConfig::default(), None).unwrap();
        let entries = scanner.scan();

        assert_eq!(
            names(&entries),
            vec!["README.md", "docs", "docs/guide.md", "src", "src/main.py"]
        );
        let readme = &entries[0];
        assert_eq!(readme.size, 6);
        assert!(!readme.is_dir);
        assert_eq!(entries[2].depth, 2);
    }

    #[test]
    fn allowlisted_files_are_found_inside_other_folders() {
        let tmp = tree();
        let config = BackupConfig {
            allowlist: BTreeSet::from([".md".to_string()]),
            ..BackupConfig::default()
        };
        let entries = Scanner::new(tmp.path(), &config, None).unwrap().scan();
        assert_eq!(names(&entries), vec!["README.md", "docs/guide.md"]);
    }

    #[test]
    fn skipped_directory_is_not_walked() {
        let tmp = tree();
        let entries = Scanner::new(tmp.path(), &BackupConfig::default(), Some(tmp.path().join("docs")))
            .unwrap()
            .scan();
        assert!(!names(&entries).iter().any(|n| n.starts_with("docs")));
    }

    #[test]
    fn single_file_source_yields_one_entry() {
        let tmp = tree();
        let entries = Scanner::new(&tmp.path().join("README.md"), &BackupConfig::default(), None)
            .unwrap()
            .scan();
        assert_eq!(names(&entries), vec!["README.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn linked_folders_are_walked() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let real = tmp.path().join("real");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("data.txt"), "data").unwrap();
        fs::write(source.join("top.txt"), "top").unwrap();
        std::os::unix::fs::symlink(&real, source.join("linked")).unwrap();
        std::os::unix::fs::symlink(real.join("data.txt"), source.join("alias.txt")).unwrap();

        let entries = Scanner::new(&source, &BackupConfig::default(), None)
            .unwrap()
            .scan();

        assert_eq!(
            names(&entries),
            vec!["alias.txt", "linked", "linked/data.txt", "top.txt"]
        );
        assert!(entries[1].is_dir);
        assert_eq!(entries[2].size, 4);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_do_not_hang_the_walk() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("sub/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&source, source.join("sub/back")).unwrap();

        let entries = Scanner::new(&source, &BackupConfig::default(), None)
            .unwrap()
            .scan();

        assert_eq!(names(&entries), vec!["sub", "sub/file.txt"]);
    }

    #[test]
    fn missing_source_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = Scanner::new(&tmp.path().join("nope"), &BackupConfig::default(), None)
            .err()
            .unwrap();
        assert!(matches!(err, BackupError::SourceNotFound(_)));
    }
}
