//! Local session persistence
//!
//! This module provides `SessionStore`, the owner of the "am I logged in and
//! until when" record:
//! - exactly one session per store, persisted as a small JSON file under a
//!   fixed path so it survives process restarts
//! - expiry is enforced lazily on read; there is no background timer
//! - no network I/O; the remote service stays the authority on token
//!   validity, the local expiry is a pre-flight approximation
//!
//! Two processes sharing the same session file do not watch each other: each
//! loads the record once at open and afterwards trusts its in-memory copy
//! until one of its own remote calls fails authorization, at which point the
//! gateway clears the copy.

use anyhow::Context;
use chrono::Duration;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::CoreError;
use crate::models::Session;

/// File-backed store holding at most one session.
///
/// All methods take `&self`; the interior lock is never held across I/O
/// boundaries visible to callers.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open a store backed by the given path, loading any persisted record.
    ///
    /// A record that cannot be read or parsed is discarded with a warning,
    /// leaving the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let current = match Self::load_persisted(&path) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Discarding unreadable session record"
                );
                let _ = std::fs::remove_file(&path);
                None
            }
        };

        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    /// Record a new session expiring `ttl` from now, replacing any prior one.
    ///
    /// The record is written through to disk before the in-memory copy is
    /// swapped, so a failed write leaves the store unchanged.
    pub fn create(&self, token: impl Into<String>, ttl: Duration) -> Result<Session, CoreError> {
        let session = Session::new(token, ttl);

        let mut guard = self.write_lock();
        self.persist(&session)?;
        *guard = Some(session.clone());

        tracing::debug!(expires_at = %session.expires_at, "Session recorded");
        Ok(session)
    }

    /// Return the session if it is still valid.
    ///
    /// An expired session is cleared (memory and disk) in the same step, so a
    /// later read cannot observe it again.
    pub fn current(&self) -> Result<Option<Session>, CoreError> {
        let mut guard = self.write_lock();

        match guard.as_ref() {
            Some(session) if session.is_expired() => {
                tracing::debug!("Session expired, clearing");
                *guard = None;
                self.remove_persisted()?;
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    /// Remove the session unconditionally. Idempotent.
    pub fn clear(&self) -> Result<(), CoreError> {
        let mut guard = self.write_lock();
        *guard = None;
        self.remove_persisted()
    }

    fn load_persisted(path: &Path) -> anyhow::Result<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file '{}'", path.display()))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file '{}'", path.display()))?;
        Ok(Some(session))
    }

    fn persist(&self, session: &Session) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create session directory '{}'", parent.display())
                })?;
            }
        }
        let content =
            serde_json::to_string(session).context("Failed to serialize session record")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file '{}'", self.path.display()))?;
        Ok(())
    }

    fn remove_persisted(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(anyhow::Error::new(e).context(format!(
                "Failed to remove session file '{}'",
                self.path.display()
            )))),
        }
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}
