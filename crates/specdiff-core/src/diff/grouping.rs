use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::computer::compute_diffs;
use super::model::{Diff, DiffResult, ExampleSegment};
use super::regions::{EndpointFilter, RegionSet};
use crate::errors::{Result, SpecDiffError};
use crate::interactions::Interaction;
use crate::model::SpecState;

/// A diff together with every interaction that exhibits it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntity {
    pub diff: Diff,
    /// Contributing interaction ids in sample order (possibly capped)
    pub interactions: Vec<String>,
    /// Example path of the first contributing interaction
    pub example_path: Vec<ExampleSegment>,
    /// Total number of contributing interactions, even past the cap
    pub occurrences: usize,
}

impl DiffEntity {
    pub fn representative_id(&self) -> Option<&str> {
        self.interactions.first().map(String::as_str)
    }
}

/// Diffs that the user chose to hide
///
/// Ignoring only filters region queries; the grouped diffs stay computed so
/// un-ignoring is instantaneous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IgnoreSet(BTreeSet<Diff>);

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the diff was already ignored
    pub fn insert(&mut self, diff: Diff) -> bool {
        self.0.insert(diff)
    }

    pub fn remove(&mut self, diff: &Diff) -> bool {
        self.0.remove(diff)
    }

    pub fn contains(&self, diff: &Diff) -> bool {
        self.0.contains(diff)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diff> {
        self.0.iter()
    }
}

impl FromIterator<Diff> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = Diff>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Grouping options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Maximum interaction ids retained per entity; `None` keeps all
    pub max_examples_per_diff: Option<usize>,
}

/// All diffs of a sample set, keyed by structural identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedDiffs {
    entities: BTreeMap<Diff, DiffEntity>,
    #[serde(skip)]
    interactions: BTreeMap<String, Interaction>,
}

impl GroupedDiffs {
    fn absorb(&mut self, result: DiffResult, options: &GroupOptions) {
        let entity = self
            .entities
            .entry(result.diff.clone())
            .or_insert_with(|| DiffEntity {
                diff: result.diff,
                interactions: Vec::new(),
                example_path: result.example_path,
                occurrences: 0,
            });
        entity.occurrences += 1;
        let under_cap = options
            .max_examples_per_diff
            .map_or(true, |cap| entity.interactions.len() < cap);
        if under_cap {
            entity.interactions.push(result.interaction_id);
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in `Diff` order
    pub fn entities(&self) -> impl Iterator<Item = &DiffEntity> {
        self.entities.values()
    }

    pub fn get(&self, diff: &Diff) -> Option<&DiffEntity> {
        self.entities.get(diff)
    }

    pub fn contains(&self, diff: &Diff) -> bool {
        self.entities.contains_key(diff)
    }

    /// # Errors
    ///
    /// Returns `DiffNotFound` if the diff is not part of this grouping.
    pub fn entity(&self, diff: &Diff) -> Result<&DiffEntity> {
        self.entities
            .get(diff)
            .ok_or_else(|| SpecDiffError::DiffNotFound {
                diff: diff.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns `InteractionNotFound` for an unknown id.
    pub fn interaction(&self, interaction_id: &str) -> Result<&Interaction> {
        self.interactions
            .get(interaction_id)
            .ok_or_else(|| SpecDiffError::InteractionNotFound {
                interaction_id: interaction_id.to_string(),
            })
    }

    pub fn interactions(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.values()
    }

    /// Every retained interaction contributing to `diff`
    ///
    /// # Errors
    ///
    /// Returns `DiffNotFound` if the diff is not part of this grouping.
    pub fn interactions_for(&self, diff: &Diff) -> Result<Vec<&Interaction>> {
        self.entity(diff)?
            .interactions
            .iter()
            .map(|id| self.interaction(id))
            .collect()
    }

    /// The interaction used to describe and interpret `diff`
    ///
    /// # Errors
    ///
    /// Returns `DiffNotFound` if the diff is not part of this grouping.
    pub fn representative(&self, diff: &Diff) -> Result<&Interaction> {
        let entity = self.entity(diff)?;
        let id = entity
            .representative_id()
            .ok_or_else(|| SpecDiffError::DiffNotFound {
                diff: diff.to_string(),
            })?;
        self.interaction(id)
    }

    /// Region view after removing ignored diffs, optionally for one endpoint
    pub fn regions<'a>(
        &'a self,
        ignored: &IgnoreSet,
        endpoint: Option<&EndpointFilter>,
    ) -> RegionSet<'a> {
        RegionSet::new(
            self.entities
                .values()
                .filter(|e| !ignored.contains(&e.diff))
                .filter(|e| endpoint.map_or(true, |f| f.matches(&e.diff))),
        )
    }
}

/// Compute and group the diffs of every interaction
///
/// # Errors
///
/// Fails fast with `DanglingShapeReference` if the specification references
/// a shape that does not exist, before any interaction is examined.
pub fn group_diffs(spec: &SpecState, interactions: &[Interaction]) -> Result<GroupedDiffs> {
    group_diffs_with(spec, interactions, &GroupOptions::default())
}

/// [`group_diffs`] with explicit options
///
/// # Errors
///
/// See [`group_diffs`].
pub fn group_diffs_with(
    spec: &SpecState,
    interactions: &[Interaction],
    options: &GroupOptions,
) -> Result<GroupedDiffs> {
    spec.check_references()?;

    let mut grouped = GroupedDiffs::default();
    for interaction in interactions {
        if grouped.interactions.contains_key(&interaction.id) {
            tracing::warn!(
                interaction_id = %interaction.id,
                "duplicate interaction id, later sample skipped"
            );
            continue;
        }
        for result in compute_diffs(spec, interaction)? {
            grouped.absorb(result, options);
        }
        grouped
            .interactions
            .insert(interaction.id.clone(), interaction.clone());
    }
    tracing::debug!(
        sample_count = interactions.len(),
        diff_count = grouped.len(),
        "diffs grouped"
    );
    Ok(grouped)
}
