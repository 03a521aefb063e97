//! Observability hook
//!
//! A session calls its observer after every recomputation and after a
//! successful commit. Observers are injected; there is no global debug state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use specdiff_core_types::{BatchId, ReviewId};

/// What caused a recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeTrigger {
    Open,
    Accept,
    Ignore,
    Unignore,
    Reset,
    Commit,
}

/// Snapshot of a session right after it recomputed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    pub review_id: ReviewId,
    pub trigger: RecomputeTrigger,
    /// Diffs against the preview specification, ignored ones included
    pub diff_count: usize,
    /// Diffs left after ignore filtering
    pub visible_count: usize,
    pub ignored_count: usize,
    pub accepted_count: usize,
    /// Index of the accepted suggestion the preview stopped at, if any
    pub failed_suggestion: Option<usize>,
}

/// Record of one committed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub review_id: ReviewId,
    pub spec_id: String,
    pub batch_id: BatchId,
    pub message: String,
    /// Commands between the batch markers
    pub command_count: usize,
    pub committed_at: DateTime<Utc>,
}

pub trait ReviewObserver: Send + Sync {
    fn on_recompute(&self, _report: &RecomputeReport) {}

    fn on_committed(&self, _receipt: &CommitReceipt) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {}
