//! Review session: suggestion accumulator, preview simulation and commit
//!
//! ## State machine
//!
//! ```text
//!            accept / ignore / unignore / reset
//!          ┌──────────────┐
//!          ▼              │
//!   Idle ◄──► Reviewing ──┘ ── begin_finishing ──► Finishing ── commit ──► Committed
//!                 ▲                                   │
//!                 └──────── cancel_finishing / reset ─┘
//! ```
//!
//! `Idle` and `Reviewing` are derived after every recomputation: the session is
//! `Idle` when nothing is accepted and no visible diff remains.
//!
//! ## Simulation
//!
//! The preview is always rebuilt from scratch: every accepted suggestion is
//! replayed in acceptance order against a clone of the real specification.
//! A suggestion that fails to apply stops the replay; it stays in the
//! accepted list and is reported through [`Simulation::failed`].
//!
//! ## Commit
//!
//! `[StartBatchCommit] + accepted commands + [EndBatchCommit]` is applied to
//! a clone, the extended log is persisted, and only then is the real
//! specification replaced. Any failure leaves the session in `Finishing`
//! with nothing applied. `commit` takes `&mut self`, so no other transition
//! can interleave with it.

#![allow(clippy::result_large_err)]

use serde::Serialize;
use specdiff_core::diff::{
    group_diffs_with, EndpointFilter, GroupOptions, GroupedDiffs, RegionKey, RegionSet,
};
use specdiff_core::errors::{ExError, ExErrorKind};
use specdiff_core::interpreters::{suggest_with, SuggestOptions};
use specdiff_core::{
    apply_all, build, describe, log_op_end, log_op_error, log_op_start, Diff, DiffDescription,
    DiffEntity, IgnoreSet, Interaction, SpecCommand, SpecDiffError, SpecState, Suggestion,
};
use specdiff_core_types::{BatchId, ReviewContext};
use specdiff_store::errors::Result;
use specdiff_store::services::SpecService;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::observer::{CommitReceipt, RecomputeReport, RecomputeTrigger, ReviewObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// No diffs pending review and nothing accepted
    Idle,
    Reviewing,
    /// Commit requested; waiting for the changelog message
    Finishing,
    Committed,
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewState::Idle => "idle",
            ReviewState::Reviewing => "reviewing",
            ReviewState::Finishing => "finishing",
            ReviewState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// A suggestion the user chose, with the diff it resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedSuggestion {
    pub diff: Diff,
    pub suggestion: Suggestion,
}

/// The accepted suggestion the preview could not apply
#[derive(Debug, Clone, Serialize)]
pub struct FailedSuggestion {
    /// Position in the accepted list
    pub index: usize,
    pub error_code: &'static str,
    pub message: String,
}

/// The disposable preview specification and the diffs computed against it
#[derive(Debug, Clone)]
pub struct Simulation {
    pub spec: SpecState,
    pub grouped: GroupedDiffs,
    /// Accepted suggestions actually replayed into `spec`
    pub applied: usize,
    pub failed: Option<FailedSuggestion>,
}

impl Simulation {
    fn replay<'s>(
        base: &SpecState,
        suggestions: impl IntoIterator<Item = &'s Suggestion>,
        interactions: &[Interaction],
        options: &GroupOptions,
    ) -> std::result::Result<Self, SpecDiffError> {
        let mut spec = base.clone();
        let mut applied = 0;
        let mut failed = None;
        for (index, suggestion) in suggestions.into_iter().enumerate() {
            match apply_all(&spec, &suggestion.commands) {
                Ok(next) => {
                    spec = next;
                    applied += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        index,
                        suggestion = %suggestion.title,
                        error = %err,
                        "accepted suggestion does not apply, preview stops before it"
                    );
                    let ex: ExError = err.into();
                    failed = Some(FailedSuggestion {
                        index,
                        error_code: ex.code(),
                        message: ex.message().to_string(),
                    });
                    break;
                }
            }
        }
        let grouped = group_diffs_with(&spec, interactions, options)?;
        Ok(Self {
            spec,
            grouped,
            applied,
            failed,
        })
    }
}

pub struct ReviewSession {
    ctx: ReviewContext,
    spec_service: Arc<dyn SpecService>,
    observer: Arc<dyn ReviewObserver>,
    group_options: GroupOptions,
    suggest_options: SuggestOptions,
    /// Persisted log the real specification was built from
    log: Vec<SpecCommand>,
    spec: SpecState,
    interactions: Vec<Interaction>,
    accepted: Vec<AcceptedSuggestion>,
    ignored: IgnoreSet,
    simulation: Simulation,
    state: ReviewState,
    receipt: Option<CommitReceipt>,
}

impl fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewSession")
            .field("review_id", &self.ctx.review_id)
            .field("spec_id", &self.ctx.spec_id)
            .field("state", &self.state)
            .field("accepted", &self.accepted.len())
            .field("ignored", &self.ignored.len())
            .finish()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl ReviewSession {
    /// Build the real specification from `log` and compute the initial diffs
    ///
    /// # Errors
    ///
    /// The log does not replay, or the specification it builds is malformed.
    pub fn open(
        ctx: ReviewContext,
        log: Vec<SpecCommand>,
        interactions: Vec<Interaction>,
        spec_service: Arc<dyn SpecService>,
        observer: Arc<dyn ReviewObserver>,
        group_options: GroupOptions,
        suggest_options: SuggestOptions,
    ) -> Result<Self> {
        let spec = build(&log).map_err(|e| ExError::from(e).with_spec_id(&ctx.spec_id))?;
        let simulation = Simulation::replay(
            &spec,
            std::iter::empty::<&Suggestion>(),
            &interactions,
            &group_options,
        )
        .map_err(|e| ExError::from(e).with_spec_id(&ctx.spec_id))?;
        let mut session = Self {
            ctx,
            spec_service,
            observer,
            group_options,
            suggest_options,
            log,
            spec,
            interactions,
            accepted: Vec::new(),
            ignored: IgnoreSet::new(),
            simulation,
            state: ReviewState::Idle,
            receipt: None,
        };
        session.settle(RecomputeTrigger::Open);
        Ok(session)
    }

    // Queries

    pub fn context(&self) -> &ReviewContext {
        &self.ctx
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    /// The real (committed) specification
    pub fn spec(&self) -> &SpecState {
        &self.spec
    }

    /// The specification with every applicable accepted suggestion replayed
    pub fn preview_spec(&self) -> &SpecState {
        &self.simulation.spec
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn accepted(&self) -> &[AcceptedSuggestion] {
        &self.accepted
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignored
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn receipt(&self) -> Option<&CommitReceipt> {
        self.receipt.as_ref()
    }

    /// All visible diffs of the preview
    pub fn regions(&self) -> RegionSet<'_> {
        self.simulation.grouped.regions(&self.ignored, None)
    }

    /// Visible diffs of one endpoint; empty means the endpoint fully matches
    pub fn regions_for(&self, path_id: &str, method: &str) -> RegionSet<'_> {
        let filter = EndpointFilter::new(path_id, method);
        self.simulation.grouped.regions(&self.ignored, Some(&filter))
    }

    pub fn diffs_in_region(&self, key: &RegionKey) -> Vec<&DiffEntity> {
        self.regions().diffs_in(key)
    }

    pub fn is_region_active(&self, key: &RegionKey, selected: &Diff) -> bool {
        self.regions().is_region_active(key, selected)
    }

    fn example(&self, diff: &Diff, interaction_id: Option<&str>) -> Result<&Interaction> {
        let grouped = &self.simulation.grouped;
        let interaction = match interaction_id {
            Some(id) => grouped.interaction(id)?,
            None => grouped.representative(diff)?,
        };
        Ok(interaction)
    }

    /// Describe a diff of the preview, using `interaction_id` or the representative
    ///
    /// # Errors
    ///
    /// `DiffNotFound` / `InteractionNotFound` for unknown inputs.
    pub fn description(&self, diff: &Diff, interaction_id: Option<&str>) -> Result<DiffDescription> {
        let interaction = self.example(diff, interaction_id)?;
        let entity = self.simulation.grouped.entity(diff)?;
        let description = describe(&self.simulation.spec, diff, interaction)?;
        Ok(description.with_occurrences(entity.occurrences))
    }

    /// Ranked suggestions for a diff of the preview
    ///
    /// Suggestions are computed against the preview specification, so they
    /// build on everything already accepted.
    ///
    /// # Errors
    ///
    /// `DiffNotFound` / `InteractionNotFound` for unknown inputs.
    pub fn suggestions_for(&self, diff: &Diff, interaction_id: Option<&str>) -> Result<Vec<Suggestion>> {
        let interaction = self.example(diff, interaction_id)?;
        Ok(suggest_with(
            &self.simulation.spec,
            diff,
            interaction,
            &self.suggest_options,
        )?)
    }

    // Mutations

    fn require(&self, allowed: &[ReviewState], action: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SpecDiffError::InvalidTransition {
                state: self.state.to_string(),
                action: action.to_string(),
            }
            .into())
        }
    }

    /// Derive Idle/Reviewing and notify the observer
    fn settle(&mut self, trigger: RecomputeTrigger) {
        let visible = self.simulation.grouped.regions(&self.ignored, None).len();
        if matches!(self.state, ReviewState::Idle | ReviewState::Reviewing) {
            self.state = if visible == 0 && self.accepted.is_empty() {
                ReviewState::Idle
            } else {
                ReviewState::Reviewing
            };
        }
        let report = RecomputeReport {
            review_id: self.ctx.review_id.clone(),
            trigger,
            diff_count: self.simulation.grouped.len(),
            visible_count: visible,
            ignored_count: self.ignored.len(),
            accepted_count: self.accepted.len(),
            failed_suggestion: self.simulation.failed.as_ref().map(|f| f.index),
        };
        tracing::debug!(
            review_id = %self.ctx.review_id,
            trigger = ?trigger,
            diff_count = report.diff_count,
            visible_count = report.visible_count,
            "review recomputed"
        );
        self.observer.on_recompute(&report);
    }

    fn resimulate(&mut self) -> Result<()> {
        self.simulation = Simulation::replay(
            &self.spec,
            self.accepted.iter().map(|a| &a.suggestion),
            &self.interactions,
            &self.group_options,
        )?;
        Ok(())
    }

    /// Preview `candidate` on top of the accepted suggestions without accepting it
    ///
    /// The session is left untouched. If the candidate itself does not apply,
    /// [`Simulation::failed`] names index `accepted().len()`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Idle`/`Reviewing`; a configuration error
    /// if the resulting specification cannot be walked.
    pub fn preview_suggestion(&self, candidate: &Suggestion) -> Result<Simulation> {
        self.require(&[ReviewState::Idle, ReviewState::Reviewing], "preview_suggestion")?;
        let simulation = Simulation::replay(
            &self.spec,
            self.accepted
                .iter()
                .map(|a| &a.suggestion)
                .chain(std::iter::once(candidate)),
            &self.interactions,
            &self.group_options,
        )?;
        tracing::debug!(
            review_id = %self.ctx.review_id,
            suggestion = %candidate.title,
            diff_count = simulation.grouped.len(),
            "suggestion previewed"
        );
        Ok(simulation)
    }

    fn accept_impl(&mut self, suggestion: Suggestion, diff: Diff) -> Result<()> {
        self.require(&[ReviewState::Reviewing], "accept")?;
        self.simulation.grouped.entity(&diff)?;
        self.accepted.push(AcceptedSuggestion { diff, suggestion });
        if let Err(err) = self.resimulate() {
            self.accepted.pop();
            return Err(err);
        }
        self.settle(RecomputeTrigger::Accept);
        Ok(())
    }

    /// Accept `suggestion` as the resolution of `diff` and rebuild the preview
    ///
    /// A suggestion that does not apply is still accepted; the preview stops
    /// before it and [`Simulation::failed`] names it.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Reviewing`; `DiffNotFound` if `diff` is
    /// not a diff of the current preview.
    pub fn accept(&mut self, suggestion: Suggestion, diff: Diff) -> Result<()> {
        log_op_start!("review_accept", review_id = self.ctx.review_id.as_str());
        let start = Instant::now();
        self.accept_impl(suggestion, diff).map_err(|e| {
            log_op_error!("review_accept", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;
        log_op_end!(
            "review_accept",
            duration_ms = elapsed_ms(start),
            accepted_count = self.accepted.len()
        );
        Ok(())
    }

    /// Whether to offer [`ReviewSession::accept_all_defaults`] for an endpoint
    ///
    /// True when the real specification documents nothing for the endpoint
    /// while traffic for it still has visible diffs.
    pub fn offers_accept_all(&self, path_id: &str, method: &str) -> bool {
        !self.spec.has_endpoint(path_id, method) && !self.regions_for(path_id, method).is_empty()
    }

    fn accept_defaults_impl(&mut self, path_id: &str, method: &str) -> Result<usize> {
        self.require(&[ReviewState::Reviewing], "accept_all_defaults")?;
        let mut accepted = 0;
        loop {
            let Some(diff) = self
                .regions_for(path_id, method)
                .iter()
                .next()
                .map(|e| e.diff.clone())
            else {
                break;
            };
            let Some(suggestion) = self.suggestions_for(&diff, None)?.into_iter().next() else {
                break;
            };
            self.accepted.push(AcceptedSuggestion {
                diff: diff.clone(),
                suggestion,
            });
            self.resimulate()?;
            accepted += 1;
            // no progress: the default did not apply or did not resolve its diff
            if self.simulation.failed.is_some() || self.simulation.grouped.entity(&diff).is_ok() {
                break;
            }
        }
        Ok(accepted)
    }

    /// Accept the default suggestion of every visible diff of one endpoint
    ///
    /// Defaults are accepted one at a time against the evolving preview until
    /// the endpoint has no visible diff left, so later suggestions build on
    /// earlier ones. Stops early when a default does not resolve its diff.
    /// Returns how many suggestions were accepted.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Reviewing`. On any error nothing is
    /// accepted.
    pub fn accept_all_defaults(&mut self, path_id: &str, method: &str) -> Result<usize> {
        log_op_start!(
            "review_accept_all",
            review_id = self.ctx.review_id.as_str(),
            path_id = path_id,
            method = method
        );
        let start = Instant::now();
        let before = self.accepted.len();
        let accepted = match self.accept_defaults_impl(path_id, method) {
            Ok(accepted) => accepted,
            Err(e) => {
                self.accepted.truncate(before);
                if let Err(restore) = self.resimulate() {
                    tracing::warn!(error = %restore, "recompute after failed accept-all failed");
                }
                log_op_error!("review_accept_all", e.clone(), duration_ms = elapsed_ms(start));
                return Err(e);
            }
        };
        self.settle(RecomputeTrigger::Accept);
        log_op_end!(
            "review_accept_all",
            duration_ms = elapsed_ms(start),
            accepted = accepted
        );
        Ok(accepted)
    }

    /// Hide a diff from every region query; no recomputation of diffs
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Idle`/`Reviewing`; `DiffNotFound` for
    /// unknown diffs.
    pub fn ignore(&mut self, diff: Diff) -> Result<()> {
        log_op_start!("review_ignore", review_id = self.ctx.review_id.as_str());
        let start = Instant::now();
        let result = self
            .require(&[ReviewState::Idle, ReviewState::Reviewing], "ignore")
            .and_then(|_| {
                self.simulation
                    .grouped
                    .entity(&diff)
                    .map(|_| ())
                    .map_err(ExError::from)
            });
        if let Err(e) = result {
            log_op_error!("review_ignore", e.clone(), duration_ms = elapsed_ms(start));
            return Err(e);
        }
        self.ignored.insert(diff);
        self.settle(RecomputeTrigger::Ignore);
        log_op_end!("review_ignore", duration_ms = elapsed_ms(start));
        Ok(())
    }

    /// Show a previously ignored diff again
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Idle`/`Reviewing`.
    pub fn unignore(&mut self, diff: &Diff) -> Result<()> {
        self.require(&[ReviewState::Idle, ReviewState::Reviewing], "unignore")?;
        if self.ignored.remove(diff) {
            self.settle(RecomputeTrigger::Unignore);
        }
        Ok(())
    }

    /// Discard accepted suggestions and ignored diffs
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once committed.
    pub fn reset(&mut self) -> Result<()> {
        log_op_start!("review_reset", review_id = self.ctx.review_id.as_str());
        let start = Instant::now();
        let result = self
            .require(
                &[ReviewState::Idle, ReviewState::Reviewing, ReviewState::Finishing],
                "reset",
            )
            .and_then(|_| {
                self.accepted.clear();
                self.ignored.clear();
                self.state = ReviewState::Reviewing;
                self.resimulate()
            });
        if let Err(e) = result {
            log_op_error!("review_reset", e.clone(), duration_ms = elapsed_ms(start));
            return Err(e);
        }
        self.settle(RecomputeTrigger::Reset);
        log_op_end!("review_reset", duration_ms = elapsed_ms(start));
        Ok(())
    }

    /// Move to `Finishing` so the user can write the changelog message
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless `Reviewing` with at least one accepted suggestion.
    pub fn begin_finishing(&mut self) -> Result<()> {
        self.require(&[ReviewState::Reviewing], "begin_finishing")?;
        if self.accepted.is_empty() {
            return Err(SpecDiffError::InvalidTransition {
                state: self.state.to_string(),
                action: "begin_finishing without accepted suggestions".to_string(),
            }
            .into());
        }
        self.state = ReviewState::Finishing;
        Ok(())
    }

    /// Leave `Finishing` without committing
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Finishing`.
    pub fn cancel_finishing(&mut self) -> Result<()> {
        self.require(&[ReviewState::Finishing], "cancel_finishing")?;
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// The batch a commit would write, bracketed by batch markers
    pub fn commit_batch(&self, batch_id: &BatchId, message: &str) -> Vec<SpecCommand> {
        let mut batch = Vec::with_capacity(self.accepted_command_count() + 2);
        batch.push(SpecCommand::StartBatchCommit {
            batch_id: batch_id.to_string(),
            message: message.to_string(),
        });
        for accepted in &self.accepted {
            batch.extend(accepted.suggestion.commands.iter().cloned());
        }
        batch.push(SpecCommand::EndBatchCommit {
            batch_id: batch_id.to_string(),
        });
        batch
    }

    fn accepted_command_count(&self) -> usize {
        self.accepted.iter().map(|a| a.suggestion.commands.len()).sum()
    }

    async fn commit_impl(&mut self, batch_id: &BatchId, message: &str) -> Result<CommitReceipt> {
        self.require(&[ReviewState::Finishing], "commit")?;
        if message.trim().is_empty() {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("review_commit")
                .with_message("commit message must not be empty"));
        }

        let batch = self.commit_batch(batch_id, message);
        let committed = apply_all(&self.spec, &batch).map_err(|e| {
            ExError::new(ExErrorKind::CommitFailed)
                .with_op("review_commit")
                .with_spec_id(&self.ctx.spec_id)
                .with_batch_id(batch_id.clone())
                .with_message("batch does not apply to the specification")
                .with_source(e.into())
        })?;

        let mut log = self.log.clone();
        log.extend(batch);
        self.spec_service
            .save_events(&self.ctx.spec_id, &log)
            .await
            .map_err(|e| {
                ExError::new(ExErrorKind::CommitFailed)
                    .with_op("review_commit")
                    .with_spec_id(&self.ctx.spec_id)
                    .with_batch_id(batch_id.clone())
                    .with_message("event log could not be saved")
                    .with_source(e)
            })?;

        let receipt = CommitReceipt {
            review_id: self.ctx.review_id.clone(),
            spec_id: self.ctx.spec_id.clone(),
            batch_id: batch_id.clone(),
            message: message.to_string(),
            command_count: self.accepted_command_count(),
            committed_at: chrono::Utc::now(),
        };

        self.log = log;
        self.spec = committed;
        self.accepted.clear();
        self.ignored.clear();
        self.state = ReviewState::Committed;
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    /// Apply every accepted suggestion to the real specification as one batch
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Finishing`; `InvalidInput` for an empty
    /// message; `CommitFailed` when the batch does not apply or cannot be
    /// saved. After an error the session is still `Finishing` and neither
    /// the real specification nor the stored log has changed.
    pub async fn commit(&mut self, message: &str) -> Result<CommitReceipt> {
        let batch_id = BatchId::new();
        log_op_start!(
            "review_commit",
            review_id = self.ctx.review_id.as_str(),
            spec_id = self.ctx.spec_id.as_str(),
            batch_id = batch_id.as_str()
        );
        let start = Instant::now();

        let receipt = match self.commit_impl(&batch_id, message).await {
            Ok(receipt) => receipt,
            Err(e) => {
                log_op_error!("review_commit", e.clone(), duration_ms = elapsed_ms(start));
                return Err(e);
            }
        };

        // The spec changed; bring the preview in line with it
        match self.resimulate() {
            Ok(()) => self.settle(RecomputeTrigger::Commit),
            Err(e) => tracing::warn!(error = %e, "recompute after commit failed"),
        }
        self.observer.on_committed(&receipt);

        log_op_end!(
            "review_commit",
            duration_ms = elapsed_ms(start),
            batch_id = batch_id.as_str(),
            command_count = receipt.command_count
        );
        Ok(receipt)
    }
}
