//! Engine entry point
//!
//! `DiffEngine` is constructed with its collaborators and opens review
//! sessions. Opening performs the two one-shot loads (specification log and
//! capture session) concurrently; diff computation starts only once both
//! have completed, so a failed load never yields a partial session.

#![allow(clippy::result_large_err)]

use specdiff_core::interactions::normalize_all;
use specdiff_core::{log_op_end, log_op_error, log_op_start};
use specdiff_core_types::{ReviewContext, TraceId};
use specdiff_store::errors::Result;
use specdiff_store::services::{SessionProvider, SpecService};
use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::observer::{NoopObserver, ReviewObserver};
use crate::session::ReviewSession;

/// Outcome of opening a review
#[derive(Debug)]
pub enum ReviewLoad {
    Ready(Box<ReviewSession>),
    /// The session provider has no such capture; not an error
    NoSession,
}

impl ReviewLoad {
    pub fn into_session(self) -> Option<ReviewSession> {
        match self {
            ReviewLoad::Ready(session) => Some(*session),
            ReviewLoad::NoSession => None,
        }
    }
}

pub struct DiffEngine {
    spec_service: Arc<dyn SpecService>,
    session_provider: Arc<dyn SessionProvider>,
    observer: Arc<dyn ReviewObserver>,
    config: EngineConfig,
}

impl DiffEngine {
    pub fn new(
        spec_service: Arc<dyn SpecService>,
        session_provider: Arc<dyn SessionProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            spec_service,
            session_provider,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReviewObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load `spec_id` and `session_id` and open a review of one against the other
    ///
    /// # Errors
    ///
    /// Load failures from either collaborator, or a specification log that
    /// does not build.
    pub async fn open_review(&self, spec_id: &str, session_id: &str) -> Result<ReviewLoad> {
        self.open_review_traced(spec_id, session_id, None).await
    }

    /// As [`DiffEngine::open_review`], correlating log events with a caller trace id
    ///
    /// # Errors
    ///
    /// As [`DiffEngine::open_review`].
    pub async fn open_review_traced(
        &self,
        spec_id: &str,
        session_id: &str,
        trace_id: Option<TraceId>,
    ) -> Result<ReviewLoad> {
        let mut ctx = ReviewContext::new(spec_id, session_id);
        if let Some(trace_id) = trace_id {
            ctx = ctx.with_trace_id(trace_id);
        }
        log_op_start!(
            "review_open",
            review_id = ctx.review_id.as_str(),
            spec_id = spec_id,
            session_id = session_id
        );
        let start = Instant::now();

        match self.open_impl(ctx).await {
            Ok(load) => {
                let outcome = match &load {
                    ReviewLoad::Ready(_) => "ready",
                    ReviewLoad::NoSession => "no_session",
                };
                log_op_end!(
                    "review_open",
                    duration_ms = start.elapsed().as_millis() as u64,
                    outcome = outcome
                );
                Ok(load)
            }
            Err(e) => {
                log_op_error!(
                    "review_open",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    async fn open_impl(&self, ctx: ReviewContext) -> Result<ReviewLoad> {
        let (log, capture) = tokio::try_join!(
            self.spec_service.list_events(&ctx.spec_id),
            self.session_provider.load_session(&ctx.session_id),
        )
        .map_err(|e| match &ctx.trace_id {
            Some(trace_id) => e.with_trace_id(trace_id.clone()),
            None => e,
        })?;

        let Some(capture) = capture else {
            tracing::debug!(session_id = %ctx.session_id, "capture session not found");
            return Ok(ReviewLoad::NoSession);
        };

        let interactions = normalize_all(capture.interactions, &self.config.normalize);
        tracing::debug!(sample_count = interactions.len(), "capture normalized");

        let session = ReviewSession::open(
            ctx,
            log,
            interactions,
            self.spec_service.clone(),
            self.observer.clone(),
            self.config.group_options(),
            self.config.suggest,
        )?;
        Ok(ReviewLoad::Ready(Box::new(session)))
    }
}
