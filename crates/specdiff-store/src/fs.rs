//! File-backed collaborators
//!
//! Layout:
//!
//! ```text
//! <spec root>/<spec_id>/events.json     digest-checked event log
//! <session root>/<session_id>.json      one capture session per file
//! ```
//!
//! Blocking file I/O runs on tokio's blocking pool.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use specdiff_core::SpecCommand;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::atomic::atomic_write;
use crate::errors::{
    digest_mismatch, invalid_key, io_error, serialization_error, spec_missing, task_error, Result,
};
use crate::services::{CaptureSession, SessionProvider, SpecService};

const EVENTS_FILE: &str = "events.json";

/// On-disk form of an event log
#[derive(Debug, Serialize, Deserialize)]
struct EventLogFile {
    spec_id: String,
    /// SHA-256 of the canonical JSON encoding of `events`
    digest: String,
    events: Vec<SpecCommand>,
}

/// Compute the digest stored alongside an event log
pub fn event_log_digest(events: &[SpecCommand]) -> Result<String> {
    let bytes = serde_json::to_vec(events).map_err(|e| serialization_error("digest_events", e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn check_key(what: &str, key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.chars().any(char::is_control);
    if valid {
        Ok(())
    } else {
        Err(invalid_key(what, key))
    }
}

/// Event logs stored as JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FsSpecService {
    root: PathBuf,
}

impl FsSpecService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn log_path(&self, spec_id: &str) -> Result<PathBuf> {
        check_key("specification", spec_id)?;
        Ok(self.root.join(spec_id).join(EVENTS_FILE))
    }
}

fn read_log(path: &Path, spec_id: &str) -> Result<Vec<SpecCommand>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(spec_missing(spec_id)),
        Err(e) => return Err(io_error("read_events", e).with_spec_id(spec_id)),
    };
    let file: EventLogFile = serde_json::from_slice(&bytes)
        .map_err(|e| serialization_error("parse_events", e).with_spec_id(spec_id))?;
    let actual = event_log_digest(&file.events)?;
    if actual != file.digest {
        return Err(digest_mismatch(spec_id, &file.digest, &actual));
    }
    Ok(file.events)
}

fn write_log(path: &Path, spec_id: &str, events: Vec<SpecCommand>) -> Result<()> {
    let file = EventLogFile {
        spec_id: spec_id.to_string(),
        digest: event_log_digest(&events)?,
        events,
    };
    let bytes = serde_json::to_vec_pretty(&file)
        .map_err(|e| serialization_error("encode_events", e).with_spec_id(spec_id))?;
    atomic_write(path, &bytes).map_err(|e| e.with_spec_id(spec_id))
}

#[async_trait]
impl SpecService for FsSpecService {
    async fn list_events(&self, spec_id: &str) -> Result<Vec<SpecCommand>> {
        let path = self.log_path(spec_id)?;
        let spec_id = spec_id.to_string();
        let events = tokio::task::spawn_blocking(move || read_log(&path, &spec_id))
            .await
            .map_err(|e| task_error("list_events", e))??;
        tracing::debug!(command_count = events.len(), "event log loaded");
        Ok(events)
    }

    async fn save_events(&self, spec_id: &str, events: &[SpecCommand]) -> Result<()> {
        let path = self.log_path(spec_id)?;
        let spec_id = spec_id.to_string();
        let events = events.to_vec();
        let count = events.len();
        tokio::task::spawn_blocking(move || write_log(&path, &spec_id, events))
            .await
            .map_err(|e| task_error("save_events", e))??;
        tracing::debug!(command_count = count, "event log saved");
        Ok(())
    }
}

/// Capture sessions stored as one JSON file each
#[derive(Debug, Clone)]
pub struct FsSessionProvider {
    root: PathBuf,
}

impl FsSessionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a session file (used by capture tooling and tests)
    ///
    /// # Errors
    ///
    /// Invalid session ids, encoding and I/O failures.
    pub fn store(&self, session: &CaptureSession) -> Result<()> {
        let path = self.session_path(&session.session_id)?;
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| serialization_error("encode_session", e))?;
        atomic_write(&path, &bytes)
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        check_key("session", session_id)?;
        Ok(self.root.join(format!("{}.json", session_id)))
    }
}

fn read_session(path: &Path) -> Result<Option<CaptureSession>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error("read_session", e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| serialization_error("parse_session", e))
}

#[async_trait]
impl SessionProvider for FsSessionProvider {
    async fn load_session(&self, session_id: &str) -> Result<Option<CaptureSession>> {
        let path = self.session_path(session_id)?;
        tokio::task::spawn_blocking(move || read_session(&path))
            .await
            .map_err(|e| task_error("load_session", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specdiff_core::errors::ExErrorKind;

    #[test]
    fn test_check_key_rejects_traversal() {
        assert!(check_key("specification", "petstore").is_ok());
        assert!(check_key("specification", "pet-store_v2").is_ok());
        assert!(check_key("specification", "").is_err());
        assert!(check_key("specification", "..").is_err());
        assert!(check_key("specification", "a/b").is_err());
        assert!(check_key("specification", "a\\b").is_err());
        let err = check_key("session", ".hidden").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_digest_is_stable_for_equal_logs() {
        let log = vec![SpecCommand::StartBatchCommit {
            batch_id: "b1".into(),
            message: "m".into(),
        }];
        assert_eq!(event_log_digest(&log).unwrap(), event_log_digest(&log).unwrap());
        assert_ne!(
            event_log_digest(&log).unwrap(),
            event_log_digest(&[]).unwrap()
        );
        assert_eq!(event_log_digest(&[]).unwrap().len(), 64);
    }
}
