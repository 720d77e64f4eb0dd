//! Boundary Partitioner: splits a group into head / eligible / islands / tail.
//!
//! - `head`: longest all-fixed prefix.
//! - `tail`: longest all-fixed suffix not overlapping `head`.
//! - `islands`: fixed choices strictly between the two runs.
//! - `eligible`: the non-fixed choices between the two runs.
//!
//! All four hold original positions in ascending (authored) order.

use crate::choice::ChoiceSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub head: Vec<usize>,
    pub eligible: Vec<usize>,
    pub islands: Vec<usize>,
    pub tail: Vec<usize>,
}

impl Partition {
    /// Total number of positions covered (equals the input length).
    pub fn len(&self) -> usize {
        self.head.len() + self.eligible.len() + self.islands.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition a choice group by its `is_fixed` flags.
pub fn partition(choices: &[ChoiceSpec]) -> Partition {
    partition_by(choices, ChoiceSpec::is_fixed)
}

/// Partition any sequence given a fixed-ness predicate.
pub fn partition_by<T>(items: &[T], is_fixed: impl Fn(&T) -> bool) -> Partition {
    let n = items.len();
    let head_end = items.iter().take_while(|x| is_fixed(x)).count();
    // Scan back only over what the head did not claim.
    let tail_len = items[head_end..]
        .iter()
        .rev()
        .take_while(|x| is_fixed(x))
        .count();
    let tail_start = n - tail_len;

    let mut p = Partition {
        head: (0..head_end).collect(),
        tail: (tail_start..n).collect(),
        ..Partition::default()
    };
    for (i, item) in items.iter().enumerate().take(tail_start).skip(head_end) {
        if is_fixed(item) {
            p.islands.push(i);
        } else {
            p.eligible.push(i);
        }
    }
    p
}
