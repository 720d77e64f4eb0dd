//! Layout Assembler and the display-order type it produces.

use serde::{Deserialize, Serialize};

use crate::choice::ChoiceSpec;
use crate::partition::Partition;
use crate::permute::permute;
use crate::seed::Seed;

/// Display order as original positions: `positions()[slot]` is the authored
/// index of the choice shown at `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShuffledLayout {
    order: Vec<usize>,
}

impl ShuffledLayout {
    /// Authored order, unchanged.
    pub fn identity(n: usize) -> Self {
        Self {
            order: (0..n).collect(),
        }
    }

    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True if every position in `0..n` appears exactly once.
    pub fn is_permutation_of(&self, n: usize) -> bool {
        if self.order.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &p in &self.order {
            match seen.get_mut(p) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        true
    }

    /// Resolve the layout against the group's choices, in display order.
    ///
    /// Positions outside `choices` are skipped; layouts produced by this crate
    /// never contain any.
    pub fn iter<'a>(&'a self, choices: &'a [ChoiceSpec]) -> impl Iterator<Item = &'a ChoiceSpec> + 'a {
        self.order.iter().filter_map(move |&p| choices.get(p))
    }
}

/// `head ++ permuted_eligible ++ islands ++ tail`.
pub fn assemble(head: &[usize], permuted_eligible: &[usize], islands: &[usize], tail: &[usize]) -> ShuffledLayout {
    let mut order =
        Vec::with_capacity(head.len() + permuted_eligible.len() + islands.len() + tail.len());
    order.extend_from_slice(head);
    order.extend_from_slice(permuted_eligible);
    order.extend_from_slice(islands);
    order.extend_from_slice(tail);
    ShuffledLayout { order }
}

/// Permute the eligible run of `p` with `seed` and assemble the final layout.
pub fn shuffled_layout(p: &Partition, seed: &Seed) -> ShuffledLayout {
    let permuted = permute(&p.eligible, seed);
    assemble(&p.head, &permuted, &p.islands, &p.tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition_by;

    #[test]
    fn assemble_concatenates_in_order() {
        let l = assemble(&[0], &[3, 1], &[2], &[4]);
        assert_eq!(l.positions(), &[0, 3, 1, 2, 4]);
        assert!(l.is_permutation_of(5));
    }

    #[test]
    fn permutation_check_rejects_duplicates_and_gaps() {
        assert!(!assemble(&[0, 0], &[], &[], &[]).is_permutation_of(2));
        assert!(!assemble(&[0, 2], &[], &[], &[]).is_permutation_of(2));
        assert!(!ShuffledLayout::identity(3).is_permutation_of(4));
        assert!(ShuffledLayout::identity(0).is_permutation_of(0));
    }

    #[test]
    fn island_scenario_seed_zero() {
        // [A(fixed), Mid, C(fixed), Mid, D(fixed)]
        let p = partition_by(&[true, false, true, false, true], |&f| f);
        let l = shuffled_layout(&p, &Seed::Int(0));
        assert_eq!(l.positions(), &[0, 1, 3, 2, 4]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let l = assemble(&[1], &[0], &[], &[]);
        assert_eq!(serde_json::to_string(&l).unwrap(), "[1,0]");
    }
}
