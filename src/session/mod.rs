//! Browsing-session persistence for the "visited" flag.
//!
//! The bootstrap sequencer reads the flag once at page ready and writes it at
//! most once, when the loader lifts. A store is injected at construction so
//! tests and hosts decide where the flag lives.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session store poisoned")]
    Poisoned,
}

/// Session-scoped storage for the loader flag.
pub trait SessionStore: Send {
    fn visited(&self) -> bool;
    fn mark_visited(&mut self) -> SessionResult<()>;
}

/// In-process session. Clones share the flag, so one handle can be kept by
/// the host while another is moved into the sequencer; a reload within the
/// same session is a new runtime built from a clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    visited: Arc<Mutex<bool>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited_already() -> Self {
        Self {
            visited: Arc::new(Mutex::new(true)),
        }
    }
}

impl SessionStore for MemorySession {
    fn visited(&self) -> bool {
        self.visited.lock().map(|guard| *guard).unwrap_or(false)
    }

    fn mark_visited(&mut self) -> SessionResult<()> {
        let mut guard = self.visited.lock().map_err(|_| SessionError::Poisoned)?;
        *guard = true;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionRecord {
    visited: bool,
}

/// JSON file backed session. A missing or unreadable file reads as a fresh
/// session; deleting the file starts a new one.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SessionRecord {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl SessionStore for FileSession {
    fn visited(&self) -> bool {
        self.load().visited
    }

    fn mark_visited(&mut self) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string(&SessionRecord { visited: true })?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("curtain-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn memory_session_clones_share_flag() {
        let host = MemorySession::new();
        let mut sequencer_copy = host.clone();
        assert!(!host.visited());
        sequencer_copy.mark_visited().unwrap();
        assert!(host.visited());
    }

    #[test]
    fn file_session_round_trips_flag() {
        let path = temp_path("session-roundtrip");
        let _ = fs::remove_file(&path);
        let mut session = FileSession::new(&path);
        assert!(!session.visited());
        session.mark_visited().unwrap();
        assert!(FileSession::new(&path).visited());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_reads_as_fresh_session() {
        let path = temp_path("session-corrupt");
        fs::write(&path, "not json").unwrap();
        assert!(!FileSession::new(&path).visited());
        let _ = fs::remove_file(&path);
    }
}
