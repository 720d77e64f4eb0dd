//! Serialization boundary for a question instance.
//!
//! A `ChoiceGroup` serializes as a versioned `GroupSnapshot`, carrying its
//! render state (layout, mask table, shuffle-done marker) when it has been
//! rendered. Restoring re-validates the choices and checks a carried render
//! state against a fresh computation before adopting it as the cache, so a
//! restored group never re-permutes and never disagrees with a fresh one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::choice::ChoiceSpec;
use crate::registry::{check_token_prefix, validate_specs, ChoiceGroup, ValidationError};
use crate::render::{ConsistencyError, RenderState};
use crate::seed::Seed;
use std::sync::OnceLock;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot_version {found} (expected {})", SNAPSHOT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("invalid choices: {0}")]
    Validation(#[from] ValidationError),
    #[error("inconsistent render state: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub snapshot_version: u32,
    pub shuffle_enabled: bool,
    pub seed: Seed,
    pub token_prefix: String,
    pub choices: Vec<ChoiceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderState>,
}

impl From<&ChoiceGroup> for GroupSnapshot {
    fn from(g: &ChoiceGroup) -> Self {
        Self {
            snapshot_version: SNAPSHOT_VERSION,
            shuffle_enabled: g.shuffle_enabled,
            seed: g.seed.clone(),
            token_prefix: g.token_prefix.clone(),
            choices: g.choices.clone(),
            render: g.rendered().cloned(),
        }
    }
}

impl From<ChoiceGroup> for GroupSnapshot {
    fn from(g: ChoiceGroup) -> Self {
        GroupSnapshot::from(&g)
    }
}

impl TryFrom<GroupSnapshot> for ChoiceGroup {
    type Error = SnapshotError;

    fn try_from(s: GroupSnapshot) -> Result<Self, Self::Error> {
        if s.snapshot_version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: s.snapshot_version,
            });
        }
        validate_specs(&s.choices)?;
        check_token_prefix(&s.token_prefix, &s.choices)?;
        let group = ChoiceGroup {
            choices: s.choices,
            shuffle_enabled: s.shuffle_enabled,
            seed: s.seed,
            token_prefix: s.token_prefix,
            render: OnceLock::new(),
        };
        if let Some(state) = s.render {
            group.adopt_render(state)?;
        }
        Ok(group)
    }
}

impl Serialize for ChoiceGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GroupSnapshot::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChoiceGroup {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snap = GroupSnapshot::deserialize(deserializer)?;
        ChoiceGroup::try_from(snap).map_err(serde::de::Error::custom)
    }
}

impl ChoiceGroup {
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot::from(self)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore from JSON, reporting validation and consistency failures as such.
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        let snap: GroupSnapshot = serde_json::from_str(s)?;
        ChoiceGroup::try_from(snap)
    }
}
