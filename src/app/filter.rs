use crate::app::models::BackupConfig;

/// Allowlist/denylist decision over `/`-separated relative paths.
///
/// Directories are passed with a trailing `/` so a fragment such as `build/`
/// only matches folders.
#[derive(Debug, Clone)]
pub struct Filter {
    allowlist: Vec<String>,
    denylist: Vec<String>,
}

impl Filter {
    pub fn new(config: &BackupConfig) -> Self {
        Self {
            allowlist: config.allowlist.iter().cloned().collect(),
            denylist: config.denylist.iter().cloned().collect(),
        }
    }

    /// True when the entry belongs in the archive. Denylist wins over allowlist.
    pub fn include(&self, path: &str) -> bool {
        let allowed = self.allowlist.is_empty() || matches_any(&self.allowlist, path);
        allowed && !self.denies(path)
    }

    /// True when the denylist matches; a denied directory is not descended into.
    pub fn denies(&self, path: &str) -> bool {
        matches_any(&self.denylist, path)
    }
}

fn matches_any(fragments: &[String], path: &str) -> bool {
    fragments
        .iter()
        .any(|fragment| !fragment.is_empty() && path.contains(fragment.as_str()))
}
