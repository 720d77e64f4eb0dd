//! Mask Table Builder.
//!
//! Tokens encode the display slot only (`<prefix><slot>`), so a rendered
//! document reveals nothing about which authored choice sits in which slot.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::choice::ChoiceSpec;
use crate::layout::ShuffledLayout;
use crate::render::ConsistencyError;

/// Unknown token or id; the caller treats it as a bad or stale submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown mask token {token:?}")]
    UnknownToken { token: String },
    #[error("unknown choice id {id:?}")]
    UnknownId { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub token: String,
    pub original_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MaskTableRepr {
    entries: Vec<MaskEntry>,
}

/// Bidirectional token <-> original id map, one entry per display slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MaskTableRepr", into = "MaskTableRepr")]
pub struct MaskTable {
    entries: Vec<MaskEntry>,
    by_token: FxHashMap<String, usize>,
    by_id: FxHashMap<String, usize>,
}

impl PartialEq for MaskTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MaskTable {}

/// Token for display slot `slot`.
pub fn mask_token(prefix: &str, slot: usize) -> String {
    format!("{prefix}{slot}")
}

/// Build the table for `layout` over `choices`.
pub fn build_mask(
    layout: &ShuffledLayout,
    choices: &[ChoiceSpec],
    token_prefix: &str,
) -> MaskTable {
    let entries = layout
        .iter(choices)
        .enumerate()
        .map(|(slot, c)| MaskEntry {
            token: mask_token(token_prefix, slot),
            original_id: c.original_id().to_string(),
        })
        .collect();
    // Tokens are distinct by construction; ids are distinct per group validation.
    MaskTable::index(entries)
}

impl MaskTable {
    fn index(entries: Vec<MaskEntry>) -> Self {
        let mut by_token = FxHashMap::default();
        let mut by_id = FxHashMap::default();
        by_token.reserve(entries.len());
        by_id.reserve(entries.len());
        for (i, e) in entries.iter().enumerate() {
            by_token.insert(e.token.clone(), i);
            by_id.insert(e.original_id.clone(), i);
        }
        Self {
            entries,
            by_token,
            by_id,
        }
    }

    /// Token shown to the student -> stable original id.
    pub fn resolve_display(&self, token: &str) -> Result<&str, LookupError> {
        self.by_token
            .get(token)
            .map(|&i| self.entries[i].original_id.as_str())
            .ok_or_else(|| LookupError::UnknownToken {
                token: token.to_string(),
            })
    }

    /// Original id -> token shown in its display slot.
    pub fn mask_of(&self, original_id: &str) -> Result<&str, LookupError> {
        self.by_id
            .get(original_id)
            .map(|&i| self.entries[i].token.as_str())
            .ok_or_else(|| LookupError::UnknownId {
                id: original_id.to_string(),
            })
    }

    /// Original ids in display order.
    pub fn unmask_order(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.original_id.as_str()).collect()
    }

    /// Tokens in display order.
    pub fn tokens(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.token.as_str()).collect()
    }

    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that this table still describes `layout` over `choices` with `token_prefix` tokens.
    pub fn verify_against(
        &self,
        layout: &ShuffledLayout,
        choices: &[ChoiceSpec],
        token_prefix: &str,
    ) -> Result<(), ConsistencyError> {
        if self.entries.len() != layout.len() {
            return Err(ConsistencyError::LengthMismatch {
                what: "mask table",
                expected: layout.len(),
                found: self.entries.len(),
            });
        }
        for (slot, (e, &pos)) in self.entries.iter().zip(layout.positions()).enumerate() {
            if e.token != mask_token(token_prefix, slot) {
                return Err(ConsistencyError::TokenMismatch {
                    slot,
                    found: e.token.clone(),
                });
            }
            let expected = choices.get(pos).map(ChoiceSpec::original_id);
            if expected != Some(e.original_id.as_str()) {
                return Err(ConsistencyError::MaskMismatch {
                    slot,
                    token: e.token.clone(),
                    found: e.original_id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<MaskTableRepr> for MaskTable {
    type Error = String;

    fn try_from(r: MaskTableRepr) -> Result<Self, Self::Error> {
        let t = MaskTable::index(r.entries);
        if t.by_token.len() != t.entries.len() {
            return Err("mask table has duplicate tokens".to_string());
        }
        if t.by_id.len() != t.entries.len() {
            return Err("mask table has duplicate original ids".to_string());
        }
        Ok(t)
    }
}

impl From<MaskTable> for MaskTableRepr {
    fn from(t: MaskTable) -> Self {
        Self { entries: t.entries }
    }
}
