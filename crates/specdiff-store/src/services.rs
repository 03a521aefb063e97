//! Collaborator traits
//!
//! The review engine never touches storage directly. It loads a
//! specification event log and a capture session once when a review opens,
//! and writes the full log back once per commit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use specdiff_core::{RawInteraction, SpecCommand};

use crate::errors::Result;

/// A recorded capture: the interactions observed against a running API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    pub session_id: String,
    #[serde(default)]
    pub interactions: Vec<RawInteraction>,
}

impl CaptureSession {
    pub fn new(session_id: impl Into<String>, interactions: Vec<RawInteraction>) -> Self {
        Self {
            session_id: session_id.into(),
            interactions,
        }
    }
}

/// Source and sink of specification event logs
#[async_trait]
pub trait SpecService: Send + Sync {
    /// Return the full event log of `spec_id`
    ///
    /// # Errors
    ///
    /// `NotFound` if the specification does not exist; `Io` / `Serialization`
    /// / `ConstraintViolation` if the stored log cannot be read back intact.
    async fn list_events(&self, spec_id: &str) -> Result<Vec<SpecCommand>>;

    /// Replace the event log of `spec_id` with `events`
    ///
    /// Must be all-or-nothing: after an error the previous log is still the
    /// one `list_events` returns.
    ///
    /// # Errors
    ///
    /// Any persistence failure.
    async fn save_events(&self, spec_id: &str, events: &[SpecCommand]) -> Result<()>;
}

/// Source of capture sessions
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Load a capture session; `Ok(None)` means there is no such session
    ///
    /// # Errors
    ///
    /// Failures reading a session that does exist.
    async fn load_session(&self, session_id: &str) -> Result<Option<CaptureSession>>;
}
