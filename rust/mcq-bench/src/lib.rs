//! Fixtures shared by the criterion benches.

use mcq_core::ChoiceDefinition;

/// `n` choices where roughly every `fixed_every`-th one is pinned.
///
/// The first and last choices are pinned too, so partitioning sees a head, a tail and islands.
/// `fixed_every = 0` pins nothing.
pub fn definitions(n: usize, fixed_every: usize) -> Vec<ChoiceDefinition> {
    (0..n)
        .map(|i| {
            let d = ChoiceDefinition::new(format!("choice text {i}"));
            let pinned = fixed_every > 0 && (i == 0 || i + 1 == n || i % fixed_every == 0);
            let d = if pinned { d.fixed() } else { d };
            if i == n / 2 {
                d.correct()
            } else {
                d
            }
        })
        .collect()
}

/// Deterministic per-attempt seeds (xorshift64, no rand dependency).
pub fn seeds(n: usize) -> Vec<i64> {
    let mut x: u64 = 0x1234_5678_9ABC_DEF0;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x >> 1) as i64
        })
        .collect()
}
