//! specdiff engine - orchestration layer
//!
//! Loads a specification and a capture session through the collaborator
//! traits, runs the pure diff pipeline from `specdiff-core`, and owns the
//! review session: accepted suggestions, ignored diffs, preview simulation
//! and the single atomic batch commit.
//!
//! This crate owns boundary logging (`log_op_start!` / `log_op_end!` /
//! `log_op_error!`); lower layers only emit detail events.

pub mod config;
pub mod engine;
pub mod observer;
pub mod services;
pub mod session;

pub use config::EngineConfig;
pub use engine::{DiffEngine, ReviewLoad};
pub use observer::{CommitReceipt, NoopObserver, RecomputeReport, RecomputeTrigger, ReviewObserver};
pub use session::{AcceptedSuggestion, FailedSuggestion, ReviewSession, ReviewState, Simulation};
