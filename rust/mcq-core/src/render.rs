//! Idempotent Render Gate.
//!
//! The first `render()` on a `ChoiceGroup` partitions, permutes, assembles and
//! masks; the result is stored in the group's own `OnceLock`, and every later
//! call returns that same value. The permutation is a pure function of the
//! seed and the group, so racing first calls can only produce identical
//! states; `OnceLock` guarantees exactly one of them is published.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::choice::ChoiceSpec;
use crate::layout::{shuffled_layout, ShuffledLayout};
use crate::mask::{build_mask, LookupError, MaskTable};
use crate::partition::{partition, Partition};
use crate::registry::ChoiceGroup;

/// A carried render state no longer matches its group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("{what} covers {found} choices, group has {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("layout is not a permutation of the group")]
    NotAPermutation,
    #[error("mask slot {slot} ({token}) maps to {found:?}, which is not the choice shown there")]
    MaskMismatch {
        slot: usize,
        token: String,
        found: String,
    },
    #[error("mask slot {slot} carries token {found:?}")]
    TokenMismatch { slot: usize, found: String },
    #[error("render state {state} a mask table but shuffle_enabled={shuffle_enabled}")]
    MaskPresence {
        state: &'static str,
        shuffle_enabled: bool,
    },
    #[error("carried layout differs from a fresh computation at slot {slot}")]
    Diverged { slot: usize },
    #[error("shuffle-done marker is {carried}, expected {expected}")]
    DoneMarker { carried: bool, expected: bool },
    #[error("group already holds a render state")]
    AlreadyRendered,
}

/// Cached result of the first render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderState {
    layout: ShuffledLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<MaskTable>,
    /// Set once a shuffle has been applied; stays false for unshuffled groups.
    shuffle_done: bool,
}

impl RenderState {
    fn compute(group: &ChoiceGroup) -> Self {
        if !group.shuffle_enabled {
            return Self {
                layout: ShuffledLayout::identity(group.choices.len()),
                mask: None,
                shuffle_done: false,
            };
        }
        let layout = shuffled_layout(&partition(&group.choices), &group.seed);
        let mask = build_mask(&layout, &group.choices, &group.token_prefix);
        Self {
            layout,
            mask: Some(mask),
            shuffle_done: true,
        }
    }

    #[inline]
    pub fn layout(&self) -> &ShuffledLayout {
        &self.layout
    }

    /// `None` when shuffling is disabled (original ids are used directly).
    #[inline]
    pub fn mask(&self) -> Option<&MaskTable> {
        self.mask.as_ref()
    }

    #[inline]
    pub fn shuffle_done(&self) -> bool {
        self.shuffle_done
    }

    /// Check this state against `group`, including a fresh recomputation.
    pub fn verify(&self, group: &ChoiceGroup) -> Result<(), ConsistencyError> {
        let n = group.choices.len();
        if self.layout.len() != n {
            return Err(ConsistencyError::LengthMismatch {
                what: "layout",
                expected: n,
                found: self.layout.len(),
            });
        }
        if !self.layout.is_permutation_of(n) {
            return Err(ConsistencyError::NotAPermutation);
        }
        match (&self.mask, group.shuffle_enabled) {
            (Some(m), true) => m.verify_against(&self.layout, &group.choices, &group.token_prefix)?,
            (None, false) => {}
            (Some(_), false) => {
                return Err(ConsistencyError::MaskPresence {
                    state: "has",
                    shuffle_enabled: false,
                })
            }
            (None, true) => {
                return Err(ConsistencyError::MaskPresence {
                    state: "lacks",
                    shuffle_enabled: true,
                })
            }
        }
        let fresh = Self::compute(group);
        if let Some(slot) = self
            .layout
            .positions()
            .iter()
            .zip(fresh.layout.positions())
            .position(|(a, b)| a != b)
        {
            return Err(ConsistencyError::Diverged { slot });
        }
        if self.shuffle_done != fresh.shuffle_done {
            return Err(ConsistencyError::DoneMarker {
                carried: self.shuffle_done,
                expected: fresh.shuffle_done,
            });
        }
        Ok(())
    }
}

/// One displayed slot as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayedChoice<'a> {
    pub slot: usize,
    /// The only identifier the renderer may emit: mask token, or original id when unmasked.
    pub visible_id: &'a str,
    pub choice: &'a ChoiceSpec,
}

impl ChoiceGroup {
    /// Compute (first call) or return (later calls) this instance's render state.
    pub fn render(&self) -> &RenderState {
        self.render.get_or_init(|| RenderState::compute(self))
    }

    /// The cached state, if `render` has run (or a rendered snapshot was restored).
    pub fn rendered(&self) -> Option<&RenderState> {
        self.render.get()
    }

    /// The shuffle-done marker.
    pub fn is_shuffle_done(&self) -> bool {
        self.render.get().is_some_and(RenderState::shuffle_done)
    }

    /// Boundary partition of this group's choices.
    pub fn partition(&self) -> Partition {
        partition(&self.choices)
    }

    /// Choices in display order.
    pub fn display(&self) -> Vec<DisplayedChoice<'_>> {
        let state = self.render();
        state
            .layout
            .iter(&self.choices)
            .enumerate()
            .map(|(slot, choice)| DisplayedChoice {
                slot,
                visible_id: match &state.mask {
                    Some(m) => m.entries()[slot].token.as_str(),
                    None => choice.original_id(),
                },
                choice,
            })
            .collect()
    }

    /// Original ids in display order.
    pub fn unmask_order(&self) -> Vec<&str> {
        self.render()
            .layout
            .iter(&self.choices)
            .map(ChoiceSpec::original_id)
            .collect()
    }

    /// Submitted identifier -> original id. Without masking only original ids resolve.
    pub fn resolve_display(&self, token: &str) -> Result<&str, LookupError> {
        match self.render().mask() {
            Some(m) => m.resolve_display(token),
            None => self
                .get(token)
                .map(ChoiceSpec::original_id)
                .ok_or_else(|| LookupError::UnknownToken {
                    token: token.to_string(),
                }),
        }
    }

    /// Original id -> the identifier shown for it.
    pub fn mask_of(&self, original_id: &str) -> Result<&str, LookupError> {
        match self.render().mask() {
            Some(m) => m.mask_of(original_id),
            None => self
                .get(original_id)
                .map(ChoiceSpec::original_id)
                .ok_or_else(|| LookupError::UnknownId {
                    id: original_id.to_string(),
                }),
        }
    }

    /// Resolve every token of a (possibly multi-select) submission; fails on the first unknown one.
    pub fn resolve_submission<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<String>, LookupError> {
        tokens
            .iter()
            .map(|t| self.resolve_display(t.as_ref()).map(str::to_string))
            .collect()
    }

    /// Install a carried render state after checking it against this group.
    pub(crate) fn adopt_render(&self, state: RenderState) -> Result<(), ConsistencyError> {
        state.verify(self)?;
        self.render
            .set(state)
            .map_err(|_| ConsistencyError::AlreadyRendered)
    }
}
