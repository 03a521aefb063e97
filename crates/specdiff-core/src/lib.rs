//! specdiff core - pure diff computation and interpretation engine
//!
//! This crate compares recorded HTTP traffic against a recorded API
//! specification and explains the result:
//! - Specification state built by replaying an ordered command log
//! - Interaction normalization (content type sentinel, structural JSON bodies)
//! - Diff computation, grouping by structural identity, and region indexing
//! - Description and suggestion interpreters producing replayable command batches
//!
//! Nothing in this crate performs I/O. Persistence and orchestration live in
//! `specdiff-store` and `specdiff-engine`.

pub mod apply;
pub mod commands;
pub mod diff;
pub mod errors;
pub mod interactions;
pub mod interpreters;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod shapes;

// Re-export commonly used types
pub use apply::{apply, apply_all, build};
pub use commands::SpecCommand;
pub use diff::{
    compute_diffs, group_diffs, Diff, DiffEntity, DiffKind, DiffLocation, DiffResult,
    GroupedDiffs, IgnoreSet, RegionKey, RegionSet, ShapeMismatch,
};
pub use errors::{ExError, ExErrorKind, Result, SpecDiffError};
pub use interactions::{normalize, Interaction, NormalizeOptions, RawInteraction};
pub use interpreters::{describe, suggest, DiffDescription, Suggestion};
pub use model::{ContentType, ShapeKind, SpecState};
