//! In-memory collaborators

use async_trait::async_trait;
use specdiff_core::SpecCommand;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::{spec_missing, Result};
use crate::services::{CaptureSession, SessionProvider, SpecService};

#[derive(Debug, Default)]
pub struct InMemorySpecService {
    logs: RwLock<HashMap<String, Vec<SpecCommand>>>,
}

impl InMemorySpecService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a specification with an existing log
    pub fn with_spec(mut self, spec_id: impl Into<String>, events: Vec<SpecCommand>) -> Self {
        self.logs.get_mut().insert(spec_id.into(), events);
        self
    }

    pub async fn insert(&self, spec_id: impl Into<String>, events: Vec<SpecCommand>) {
        self.logs.write().await.insert(spec_id.into(), events);
    }
}

#[async_trait]
impl SpecService for InMemorySpecService {
    async fn list_events(&self, spec_id: &str) -> Result<Vec<SpecCommand>> {
        self.logs
            .read()
            .await
            .get(spec_id)
            .cloned()
            .ok_or_else(|| spec_missing(spec_id))
    }

    async fn save_events(&self, spec_id: &str, events: &[SpecCommand]) -> Result<()> {
        self.logs
            .write()
            .await
            .insert(spec_id.to_string(), events.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionProvider {
    sessions: HashMap<String, CaptureSession>,
}

impl InMemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: CaptureSession) -> Self {
        self.sessions.insert(session.session_id.clone(), session);
        self
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    async fn load_session(&self, session_id: &str) -> Result<Option<CaptureSession>> {
        Ok(self.sessions.get(session_id).cloned())
    }
}
