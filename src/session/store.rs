use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::Session;
use crate::runtime::Runtime;

/// Persistence backend for the session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores the session as a JSON file.
pub struct FileSessionStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> FileSessionStore<R> {
    pub fn new(runtime: R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Runtime> SessionStore for FileSessionStore<R> {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> Result<Option<Session>> {
        if !self.runtime.exists(&self.path) {
            debug!("No session file at {}", self.path.display());
            return Ok(None);
        }

        let content = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self, session))]
    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                self.runtime.create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        self.runtime
            .write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;

        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        if self.runtime.exists(&self.path) {
            self.runtime
                .remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file {}", self.path.display()))?;
            debug!("Session file {} removed", self.path.display());
        }
        Ok(())
    }
}

/// Keeps the session in process memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    /// What is currently persisted.
    pub fn snapshot(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
