//! Shape inference from observed values and deterministic id allocation

pub mod ids;
pub mod inference;

pub use ids::IdAllocator;
pub use inference::{infer_shape, InferredShape};
