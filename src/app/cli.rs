use crate::app::error::BackupError;
use crate::app::models::BackupTarget;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Archive folders into dated zip files",
    long_about = "Archive folders into dated zip files.\n\n\
        Each target reads its filters from <SAVE>/cache/<NAME>.json. When that file does not \
        exist yet it is created with defaults and the target is skipped for this run, so the \
        filters can be reviewed before the first archive is built."
)]
pub struct Cli {
    /// Directory that receives the zip files (created if absent)
    pub save: PathBuf,

    /// Back up PATH, naming the archive after its final path segment
    #[arg(short = 'f', value_name = "PATH", action = ArgAction::Append)]
    pub fast: Vec<PathBuf>,

    /// Back up PATH under an explicit archive NAME
    #[arg(short = 'n', num_args = 2, value_names = ["PATH", "NAME"], action = ArgAction::Append)]
    pub named: Vec<String>,

    /// Ignore config files and use built-in filters, without auto-clean (all targets)
    #[arg(long)]
    pub force: bool,

    /// Name archives <NAME>.zip and overwrite them on every run (all targets)
    #[arg(long)]
    pub dateless: bool,

    /// Show what would be archived and cleaned without touching the disk (all targets)
    #[arg(long)]
    pub preview: bool,
}

/// A target as requested on the command line, before its path is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetArg {
    Fast(PathBuf),
    Named(PathBuf, String),
}

impl TargetArg {
    /// Name used in log lines, available even when resolution fails.
    pub fn label(&self) -> String {
        match self {
            Self::Fast(path) => path.display().to_string(),
            Self::Named(_, name) => name.clone(),
        }
    }

    pub fn resolve(&self) -> Result<BackupTarget, BackupError> {
        let (path, name) = match self {
            Self::Fast(path) => (path, None),
            Self::Named(path, name) => (path, Some(name.clone())),
        };

        let source_path = path
            .canonicalize()
            .map_err(|_| BackupError::SourceNotFound(path.to_path_buf()))?;
        let display_name = name.unwrap_or_else(|| derive_name(&source_path));

        Ok(BackupTarget {
            source_path,
            display_name,
        })
    }
}

/// Parsed invocation with targets in command-line order.
#[derive(Debug)]
pub struct Invocation {
    pub save: PathBuf,
    pub targets: Vec<TargetArg>,
    pub force: bool,
    pub dateless: bool,
    pub preview: bool,
}

pub fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;

    let mut ordered: Vec<(usize, TargetArg)> = Vec::new();

    let fast_indices = matches.indices_of("fast").into_iter().flatten();
    for (index, path) in fast_indices.zip(cli.fast) {
        ordered.push((index, TargetArg::Fast(path)));
    }

    // -n yields two values per occurrence; the first index marks the occurrence.
    let named_indices = matches.indices_of("named").into_iter().flatten().step_by(2);
    for (index, pair) in named_indices.zip(cli.named.chunks(2)) {
        let name = normalize_name(&pair[1])?;
        ordered.push((index, TargetArg::Named(PathBuf::from(&pair[0]), name)));
    }

    ordered.sort_by_key(|(index, _)| *index);

    Ok(Invocation {
        save: cli.save,
        targets: ordered.into_iter().map(|(_, request)| request).collect(),
        force: cli.force,
        dateless: cli.dateless,
        preview: cli.preview,
    })
}

/// Strips a trailing `.zip` and rejects names that cannot be a file name.
fn normalize_name(raw: &str) -> Result<String, clap::Error> {
    let name = raw.strip_suffix(".zip").unwrap_or(raw);
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Cli::command().error(
            ErrorKind::InvalidValue,
            format!("invalid archive name '{}' for -n", raw),
        ));
    }
    Ok(name.to_string())
}

/// File stem for files, final segment for directories.
fn derive_name(source: &Path) -> String {
    let segment = if source.is_file() {
        source.file_stem()
    } else {
        source.file_name()
    };
    segment
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn targets_keep_command_line_order() {
        let inv = parse_from([
            "prog", "save", "-n", "b", "beta", "-f", "a", "-n", "c", "gamma.zip", "-f", "d",
            "--dateless",
        ])
        .unwrap();

        assert_eq!(
            inv.targets,
            vec![
                TargetArg::Named(PathBuf::from("b"), "beta".into()),
                TargetArg::Fast(PathBuf::from("a")),
                TargetArg::Named(PathBuf::from("c"), "gamma".into()),
                TargetArg::Fast(PathBuf::from("d")),
            ]
        );
        assert!(inv.dateless);
        assert!(!inv.force && !inv.preview);
        assert_eq!(inv.save, PathBuf::from("save"));
    }

    #[test]
    fn named_flag_requires_two_values() {
        let err = parse_from(["prog", "save", "-n", "only-path"]).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn save_is_required() {
        assert!(parse_from(["prog"]).is_err());
    }

    #[test]
    fn rejects_names_with_separators() {
        let err = parse_from(["prog", "save", "-n", "dir", "a/b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn fast_targets_are_named_after_the_folder_or_file_stem() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("project");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("notes.txt"), "x").unwrap();

        let dir_target = TargetArg::Fast(folder.join(".")).resolve().unwrap();
        assert_eq!(dir_target.display_name, "project");

        let file_target = TargetArg::Fast(folder.join("notes.txt")).resolve().unwrap();
        assert_eq!(file_target.display_name, "notes");
    }

    #[test]
    fn missing_source_fails_resolution() {
        let err = TargetArg::Named(PathBuf::from("/definitely/not/here"), "x".into())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, BackupError::SourceNotFound(_)));
    }
}
