use crate::app::error::BackupError;
use crate::app::formatter::OutputGenerator;
use crate::app::interrupt::InFlight;
use crate::app::models::{ArchiveReport, BackupConfig, BackupTarget, FileEntry, Settings};
use crate::app::scanner::Scanner;
use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const COMPRESSION_LEVEL: i64 = 9;

/// Turns a target's filtered source tree into `<save>/<[date-]name>.zip`.
pub struct Archiver<'a> {
    settings: &'a Settings,
    in_flight: &'a InFlight,
}

impl<'a> Archiver<'a> {
    pub fn new(settings: &'a Settings, in_flight: &'a InFlight) -> Self {
        Self {
            settings,
            in_flight,
        }
    }

    /// Writes the archive, or in preview mode prints what would be written and returns `None`.
    pub fn archive(
        &self,
        target: &BackupTarget,
        config: &BackupConfig,
    ) -> Result<Option<ArchiveReport>, BackupError> {
        let scanner = Scanner::new(
            &target.source_path,
            config,
            Some(self.settings.backup_root.clone()),
        )?;
        let entries = scanner.scan();
        let destination = self.settings.archive_path(&target.display_name);

        if self.settings.preview {
            print!(
                "{}",
                OutputGenerator::format_preview(&target.display_name, &entries, &destination)
            );
            return Ok(None);
        }

        if entries.is_empty() {
            log::warn!("[{}] no entries passed the filter", target.display_name);
        }

        let report = self.write_archive(&destination, &entries)?;
        Ok(Some(report))
    }

    /// Builds the zip in a temp file next to `destination`, then renames it into place.
    fn write_archive(
        &self,
        destination: &Path,
        entries: &[FileEntry],
    ) -> Result<ArchiveReport, BackupError> {
        // Only archive files are overwritten, never a folder that happens to share the name.
        if destination.is_dir() {
            return Err(BackupError::Write(
                destination.to_path_buf(),
                io::Error::new(io::ErrorKind::AlreadyExists, "destination is a directory"),
            ));
        }

        let backup_root = &self.settings.backup_root;
        let temp = tempfile::Builder::new()
            .prefix(".backup-")
            .suffix(".tmp")
            .tempfile_in(backup_root)
            .map_err(|e| BackupError::Write(backup_root.clone(), e))?;

        self.in_flight.track(temp.path());
        let result = fill_and_persist(temp, destination, entries);
        self.in_flight.clear();
        result
    }
}

fn fill_and_persist(
    mut temp: NamedTempFile,
    destination: &Path,
    entries: &[FileEntry],
) -> Result<ArchiveReport, BackupError> {
    let write_err = |e: io::Error| BackupError::Write(destination.to_path_buf(), e);
    let zip_err = |e: zip::result::ZipError| BackupError::Archive(destination.to_path_buf(), e);

    let mut input_bytes = 0;
    {
        let mut zip = ZipWriter::new(temp.as_file_mut());
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));

        for entry in entries {
            if entry.is_dir {
                zip.add_directory(format!("{}/", entry.relative_path), options)
                    .map_err(zip_err)?;
                continue;
            }

            let mut source = File::open(&entry.path)
                .map_err(|e| BackupError::SourceRead(entry.path.clone(), e))?;
            zip.start_file(
                entry.relative_path.as_str(),
                options.large_file(entry.size >= u32::MAX as u64),
            )
            .map_err(zip_err)?;
            input_bytes += io::copy(&mut source, &mut zip)
                .map_err(|e| BackupError::SourceRead(entry.path.clone(), e))?;
        }

        zip.finish().map_err(zip_err)?;
    }

    log_entries(&temp).map_err(zip_err)?;

    let archive_bytes = temp.as_file().metadata().map_err(write_err)?.len();
    temp.persist(destination)
        .map_err(|e| BackupError::Write(destination.to_path_buf(), e.error))?;

    Ok(ArchiveReport {
        path: destination.to_path_buf(),
        entries: entries.len(),
        input_bytes,
        archive_bytes,
        max_depth: entries.iter().map(|e| e.depth).max().unwrap_or(0),
    })
}

/// Logs every stored entry with its size before and after compression.
fn log_entries(temp: &NamedTempFile) -> zip::result::ZipResult<()> {
    let mut archive = ZipArchive::new(temp.reopen()?)?;
    for index in 0..archive.len() {
        let file = archive.by_index(index)?;
        if file.is_dir() {
            log::info!("{}", file.name());
        } else {
            log::info!(
                "{}",
                OutputGenerator::format_entry(file.name(), file.size(), file.compressed_size())
            );
        }
    }
    Ok(())
}
