//! Diff computation, grouping and region indexing

pub mod computer;
pub mod grouping;
pub mod model;
pub mod regions;
pub mod shapes;

pub use computer::compute_diffs;
pub use grouping::{group_diffs, group_diffs_with, DiffEntity, GroupOptions, GroupedDiffs, IgnoreSet};
pub use model::{
    BodyLocation, BodyOwner, Diff, DiffKind, DiffLocation, DiffRegion, DiffResult, EndpointRef,
    ExampleSegment, JsonTrail, JsonTrailSegment, ShapeMismatch, ShapeTrail, ShapeTrailStep,
};
pub use regions::{EndpointFilter, RegionKey, RegionSet};
pub use shapes::{diff_body, ShapeDiff};
