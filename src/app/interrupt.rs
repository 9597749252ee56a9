use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Exit status used when the run is cut short by Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// The temp archive currently being written, shared with the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    path: Arc<Mutex<Option<PathBuf>>>,
}

impl InFlight {
    pub fn track(&self, path: &Path) {
        if let Ok(mut slot) = self.path.lock() {
            *slot = Some(path.to_path_buf());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.path.lock() {
            *slot = None;
        }
    }

    pub fn current(&self) -> Option<PathBuf> {
        self.path.lock().ok().and_then(|slot| slot.clone())
    }

    /// Deletes the tracked temp file, returning its path if one was removed.
    pub fn remove(&self) -> Option<PathBuf> {
        let path = self.path.lock().ok()?.take()?;
        fs::remove_file(&path).ok()?;
        Some(path)
    }
}

/// Installs a Ctrl-C handler that removes the in-flight temp archive and exits.
pub fn install(in_flight: InFlight) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if let Some(path) = in_flight.remove() {
            log::warn!("removed temp file {}", path.display());
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}
