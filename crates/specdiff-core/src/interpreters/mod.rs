//! Interpreters turn a selected diff into something a person can act on
//!
//! Both interpreters take the same input (specification, diff,
//! representative interaction) and are pure: no I/O, no shared state, and
//! the same input always yields the same output, including generated ids.

pub mod description;
pub mod suggestions;

pub use description::{describe, BodySide, DiffDescription, ExampleTag, ShapeTag};
pub use suggestions::{suggest, suggest_with, SuggestOptions, Suggestion};

use serde_json::Value;

use crate::diff::{compute_diffs, Diff, DiffRegion, DiffResult, ExampleSegment};
use crate::errors::{Result, SpecDiffError};
use crate::interactions::{Interaction, ObservedBody};
use crate::model::SpecState;

/// A diff as exhibited by one concrete interaction
pub(crate) struct Located<'a> {
    pub result: DiffResult,
    pub body: Option<&'a ObservedBody>,
    /// The observed value at the diff's position, if any
    pub observed: Option<&'a Value>,
}

pub(crate) fn body_side(diff: &Diff) -> Option<BodySide> {
    match diff.location.region {
        DiffRegion::Url => None,
        DiffRegion::Request { .. } => Some(BodySide::Request),
        DiffRegion::Response { .. } => Some(BodySide::Response),
    }
}

fn lookup<'v>(root: &'v Value, path: &[ExampleSegment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        ExampleSegment::Key(key) => value.get(key),
        ExampleSegment::Index(index) => value.get(*index),
    })
}

/// Re-run the diff computer on `interaction` and find `diff` in its output
pub(crate) fn locate<'a>(
    spec: &SpecState,
    diff: &Diff,
    interaction: &'a Interaction,
) -> Result<Located<'a>> {
    let result = compute_diffs(spec, interaction)?
        .into_iter()
        .find(|r| &r.diff == diff)
        .ok_or_else(|| SpecDiffError::DiffNotFound {
            diff: format!("{} (interaction {})", diff, interaction.id),
        })?;
    let body = match body_side(diff) {
        Some(BodySide::Request) => Some(&interaction.request),
        Some(BodySide::Response) => Some(&interaction.response),
        None => None,
    };
    let observed = body
        .and_then(|b| b.value.as_ref())
        .and_then(|root| lookup(root, &result.example_path));
    Ok(Located {
        result,
        body,
        observed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_follows_keys_and_indices() {
        let value = json!({"items": [{"id": 1}, {"id": 2}]});
        let path = vec![
            ExampleSegment::Key("items".into()),
            ExampleSegment::Index(1),
            ExampleSegment::Key("id".into()),
        ];
        assert_eq!(lookup(&value, &path), Some(&json!(2)));
        assert_eq!(lookup(&value, &[ExampleSegment::Key("nope".into())]), None);
        assert_eq!(lookup(&value, &[]), Some(&value));
    }
}
