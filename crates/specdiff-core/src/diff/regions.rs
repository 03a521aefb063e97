//! Region index over grouped diffs
//!
//! A [`RegionSet`] partitions the active (non-ignored) entities by the area
//! of the interaction they concern. Membership is derived from each diff's
//! kind and location, so building a view is a single pass and never
//! recomputes diffs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::grouping::DiffEntity;
use super::model::{Diff, DiffKind, DiffRegion};
use crate::model::ContentType;

/// Restricts a region view to one declared endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointFilter {
    pub path_id: String,
    pub method: String,
}

impl EndpointFilter {
    pub fn new(path_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path_id: path_id.into(),
            method: method.into(),
        }
    }

    pub fn matches(&self, diff: &Diff) -> bool {
        let endpoint = &diff.location.endpoint;
        endpoint.path_id.as_deref() == Some(self.path_id.as_str())
            && endpoint.method.eq_ignore_ascii_case(&self.method)
    }
}

/// Addressable area of a region view
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionKey {
    /// Body diffs of requests with this content type
    RequestContentType(ContentType),
    /// Every response diff for a declared status code
    ResponseStatusCode(u16),
    /// Body diffs of one declared (status code, content type) response
    ResponseBody {
        status_code: u16,
        content_type: ContentType,
    },
    UnmatchedRequestContentType,
    UnmatchedResponseContentType,
    UnmatchedStatusCode,
    UnmatchedPath,
}

impl RegionKey {
    /// Region keys a diff belongs to
    pub fn for_diff(diff: &Diff) -> Vec<RegionKey> {
        match (&diff.kind, &diff.location.region) {
            (DiffKind::UnmatchedPath, _) => vec![RegionKey::UnmatchedPath],
            (DiffKind::UnmatchedRequestContentType, _) => {
                vec![RegionKey::UnmatchedRequestContentType]
            }
            (DiffKind::UnmatchedStatusCode, _) => vec![RegionKey::UnmatchedStatusCode],
            (DiffKind::UnmatchedResponseContentType, DiffRegion::Response { status_code, .. }) => {
                vec![
                    RegionKey::UnmatchedResponseContentType,
                    RegionKey::ResponseStatusCode(*status_code),
                ]
            }
            (DiffKind::UnmatchedResponseContentType, _) => {
                vec![RegionKey::UnmatchedResponseContentType]
            }
            (DiffKind::BodyShapeMismatch(_), DiffRegion::Request { content_type }) => {
                vec![RegionKey::RequestContentType(content_type.clone())]
            }
            (
                DiffKind::BodyShapeMismatch(_),
                DiffRegion::Response {
                    status_code,
                    content_type: Some(content_type),
                },
            ) => vec![
                RegionKey::ResponseStatusCode(*status_code),
                RegionKey::ResponseBody {
                    status_code: *status_code,
                    content_type: content_type.clone(),
                },
            ],
            (DiffKind::BodyShapeMismatch(_), _) => Vec::new(),
        }
    }
}

/// Read-only partitioned view over active diff entities
#[derive(Debug, Clone, Default)]
pub struct RegionSet<'a> {
    entities: Vec<&'a DiffEntity>,
}

impl<'a> RegionSet<'a> {
    pub fn new(entities: impl IntoIterator<Item = &'a DiffEntity>) -> Self {
        Self {
            entities: entities.into_iter().collect(),
        }
    }

    /// True only when no area holds any diff; gates the "fully matching" signal
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a DiffEntity> + '_ {
        self.entities.iter().copied()
    }

    /// Every region key holding at least one diff
    pub fn keys(&self) -> BTreeSet<RegionKey> {
        self.entities
            .iter()
            .flat_map(|e| RegionKey::for_diff(&e.diff))
            .collect()
    }

    pub fn diffs_in(&self, key: &RegionKey) -> Vec<&'a DiffEntity> {
        self.entities
            .iter()
            .copied()
            .filter(|e| RegionKey::for_diff(&e.diff).contains(key))
            .collect()
    }

    /// Whether the region holds a diff structurally equal to `selected`
    pub fn is_region_active(&self, key: &RegionKey, selected: &Diff) -> bool {
        self.entities
            .iter()
            .any(|e| &e.diff == selected && RegionKey::for_diff(&e.diff).contains(key))
    }

    pub fn request_content_types(&self) -> BTreeSet<ContentType> {
        self.keys()
            .into_iter()
            .filter_map(|k| match k {
                RegionKey::RequestContentType(ct) => Some(ct),
                _ => None,
            })
            .collect()
    }

    pub fn in_request(&self, content_type: &ContentType) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::RequestContentType(content_type.clone()))
    }

    /// Declared status codes with at least one response diff
    pub fn status_codes(&self) -> BTreeSet<u16> {
        self.keys()
            .into_iter()
            .filter_map(|k| match k {
                RegionKey::ResponseStatusCode(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    pub fn in_response_with_status_code(&self, status_code: u16) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::ResponseStatusCode(status_code))
    }

    pub fn in_response_body_shape(
        &self,
        status_code: u16,
        content_type: &ContentType,
    ) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::ResponseBody {
            status_code,
            content_type: content_type.clone(),
        })
    }

    pub fn unmatched_request_content_type(&self) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::UnmatchedRequestContentType)
    }

    pub fn unmatched_response_content_type(&self) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::UnmatchedResponseContentType)
    }

    pub fn unmatched_status_code(&self) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::UnmatchedStatusCode)
    }

    pub fn unmatched_path(&self) -> Vec<&'a DiffEntity> {
        self.diffs_in(&RegionKey::UnmatchedPath)
    }
}
