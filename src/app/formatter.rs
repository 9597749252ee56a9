use crate::app::models::{deflate_percent, ArchiveReport, FileEntry};
use std::path::{Path, PathBuf};

pub struct OutputGenerator;

impl OutputGenerator {
    pub fn generate_tree(entries: &[FileEntry]) -> String {
        let mut output = String::new();

        for entry in entries {
            let indent = "    ".repeat(entry.depth.saturating_sub(1));
            let name = entry.path.file_name().unwrap_or_default().to_string_lossy();

            if entry.is_dir {
                output.push_str(&format!("{}{}/\n", indent, name));
            } else {
                output.push_str(&format!("{}{} ({} bytes)\n", indent, name, entry.size));
            }
        }

        output.trim_end().to_string()
    }

    /// Archive listing printed by a preview run for one target.
    pub fn format_preview(display_name: &str, entries: &[FileEntry], destination: &Path) -> String {
        let mut out = format!("[{}] would write {}\n", display_name, destination.display());

        if entries.is_empty() {
            out.push_str("(no entries)\n");
        } else {
            out.push_str(&Self::generate_tree(entries));
            out.push('\n');
        }

        out
    }

    pub fn format_deletion_plan(display_name: &str, deletions: &[PathBuf]) -> String {
        if deletions.is_empty() {
            return format!("[{}] auto_clean: nothing to delete\n", display_name);
        }

        deletions
            .iter()
            .map(|path| format!("[{}] auto_clean: would delete {}\n", display_name, path.display()))
            .collect()
    }

    /// One stored file: `name (size -> compressed deflate xx.xx%)`.
    pub fn format_entry(name: &str, size: u64, compressed: u64) -> String {
        format!(
            "{} ({} -> {} deflate {:.2}%)",
            name,
            size,
            compressed,
            deflate_percent(size, compressed)
        )
    }

    pub fn format_summary(report: &ArchiveReport) -> String {
        format!(
            "wrote {} ({} entries, {} -> {} bytes, deflate {:.2}%, max depth {})",
            report.path.display(),
            report.entries,
            report.input_bytes,
            report.archive_bytes,
            report.deflate_percent(),
            report.max_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(relative: &str, is_dir: bool, size: u64) -> FileEntry {
        FileEntry {
            path: PathBuf::from("/src").join(relative),
            relative_path: relative.to_string(),
            depth: relative.split('/').count(),
            is_dir,
            size,
        }
    }

    #[test]
    fn tree_indents_by_depth() {
        let entries = vec![
            entry("a.txt", false, 3),
            entry("lib", true, 0),
            entry("lib/b.rs", false, 10),
        ];
        assert_eq!(
            OutputGenerator::generate_tree(&entries),
            "a.txt (3 bytes)\nlib/\n    b.rs (10 bytes)"
        );
    }

    #[test]
    fn preview_of_empty_target() {
        let out = OutputGenerator::format_preview("x", &[], Path::new("/b/2023-11-28-x.zip"));
        assert_eq!(out, "[x] would write /b/2023-11-28-x.zip\n(no entries)\n");
    }

    #[test]
    fn deletion_plan_lists_each_archive() {
        let deletions = vec![
            PathBuf::from("/b/2023-11-01-x.zip"),
            PathBuf::from("/b/2023-11-10-x.zip"),
        ];
        let out = OutputGenerator::format_deletion_plan("x", &deletions);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("would delete /b/2023-11-10-x.zip"));
        assert!(OutputGenerator::format_deletion_plan("x", &[]).contains("nothing to delete"));
    }

    #[test]
    fn summary_reports_ratio() {
        let report = ArchiveReport {
            path: PathBuf::from("/b/x.zip"),
            entries: 2,
            input_bytes: 200,
            archive_bytes: 50,
            max_depth: 3,
        };
        assert!(OutputGenerator::format_summary(&report).ends_with("deflate 75.00%, max depth 3)"));
    }

    #[test]
    fn entry_line_shows_compressed_size() {
        assert_eq!(
            OutputGenerator::format_entry("lib/b.rs", 400, 100),
            "lib/b.rs (400 -> 100 deflate 75.00%)"
        );
        assert_eq!(
            OutputGenerator::format_entry("empty.txt", 0, 2),
            "empty.txt (0 -> 2 deflate 0.00%)"
        );
    }
}
