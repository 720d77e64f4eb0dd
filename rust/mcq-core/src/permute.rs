//! Deterministic Permutation Generator.
//!
//! A fresh MT19937 stream is keyed from the seed for every call, then a
//! descending Fisher-Yates walk picks `j = floor(random() * (i + 1))` for
//! `i = n-1 .. 1`. The result depends only on the seed and the input length;
//! element values are never examined.

use crate::mt::Mt19937;
use crate::seed::Seed;

/// Shuffle `items` in place.
pub fn shuffle_in_place<T>(items: &mut [T], seed: &Seed) {
    if items.len() <= 1 {
        return;
    }
    let mut rng = Mt19937::from_key(&seed.key_words());
    for i in (1..items.len()).rev() {
        // random() < 1.0, so j <= i.
        let j = (rng.next_f64() * (i + 1) as f64) as usize;
        items.swap(i, j);
    }
}

/// Return a permuted copy of `eligible`.
pub fn permute<T: Clone>(eligible: &[T], seed: &Seed) -> Vec<T> {
    let mut out = eligible.to_vec();
    shuffle_in_place(&mut out, seed);
    out
}

/// The permutation itself: `result[k]` is the input index shown at slot `k`.
pub fn permutation(n: usize, seed: &Seed) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    shuffle_in_place(&mut idx, seed);
    idx
}
