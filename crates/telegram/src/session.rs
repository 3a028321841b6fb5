use std::{
    path::PathBuf,
    sync::atomic::{AtomicI64, Ordering},
};

use tracing::{debug, warn};

// Sentinel for "nothing stored yet this session".
const UNSTORED: i64 = i64::MIN;

/// Update offset persisted across restarts.
///
/// Offsets are only meaningful for the token that produced them, so the CLI
/// deletes this file when the bot token is rotated.
pub struct SessionState {
    path: PathBuf,
    last_stored: AtomicI64,
}

impl SessionState {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_stored: AtomicI64::new(UNSTORED),
        }
    }

    /// Last confirmed update offset, or 0 for a fresh session.
    #[must_use]
    pub fn load_offset(&self) -> i32 {
        let offset = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(path = %self.path.display(), "malformed session file, starting from 0");
                0
            }),
            Err(_) => 0,
        };
        self.last_stored.store(i64::from(offset), Ordering::Relaxed);
        offset
    }

    /// Persist the current offset. A no-op when the offset has not moved
    /// since the last store, so idle polling rounds never touch the disk.
    /// Failures are logged; losing an offset only means reprocessing a
    /// batch after restart.
    pub fn store_offset(&self, offset: i32) {
        if self.last_stored.swap(i64::from(offset), Ordering::Relaxed) == i64::from(offset) {
            return;
        }
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.path, offset.to_string()) {
            warn!(path = %self.path.display(), error = %e, "failed to persist session offset");
        }
    }

    /// Delete the session file. Called when the bot token changes.
    pub fn invalidate(&self) {
        self.last_stored.store(UNSTORED, Ordering::Relaxed);
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "session file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove session file"),
        }
    }
}
