//! Per-student / per-attempt seeds and their expansion into generator keys.
//!
//! Integer seeds key the generator with `|seed|` split into 32-bit words,
//! least-significant word first. Text seeds key it with the integer whose
//! big-endian bytes are `utf8(seed) ++ sha512(utf8(seed))`. Both conventions
//! match the reference Mersenne Twister seeding, so a seed yields the same
//! stream here as in any other implementation that follows it.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Decimal input that does not fit an integer seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("integer seed {input:?} is outside the 64-bit signed range")]
pub struct SeedError {
    pub input: String,
}

/// Caller-supplied seed; stable for one student attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Int(i64),
    Text(String),
}

impl Seed {
    /// Parse a command-line style seed: decimal integers become `Int`, anything else `Text`.
    ///
    /// A decimal integer that overflows `i64` is an error, never a text seed.
    pub fn parse_lossless(s: &str) -> Result<Seed, SeedError> {
        let digits = s.strip_prefix(&['-', '+'][..]).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Seed::Text(s.to_string()));
        }
        s.parse::<i64>().map(Seed::Int).map_err(|_| SeedError {
            input: s.to_string(),
        })
    }

    /// Generator key for `init_by_array` (never empty).
    pub fn key_words(&self) -> Vec<u32> {
        match self {
            Seed::Int(v) => {
                let a = v.unsigned_abs();
                trim_key(vec![a as u32, (a >> 32) as u32])
            }
            Seed::Text(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.extend_from_slice(&Sha512::digest(s.as_bytes()));
                words_from_be_bytes(&bytes)
            }
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Int(v) => write!(f, "{v}"),
            Seed::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Seed {
    fn from(v: i64) -> Self {
        Seed::Int(v)
    }
}

impl From<i32> for Seed {
    fn from(v: i32) -> Self {
        Seed::Int(i64::from(v))
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

/// Big-endian byte string -> little-endian 32-bit words of the same integer.
fn words_from_be_bytes(bytes: &[u8]) -> Vec<u32> {
    let mut words = Vec::with_capacity(bytes.len() / 4 + 1);
    let mut end = bytes.len();
    while end > 0 {
        let start = end.saturating_sub(4);
        let w = bytes[start..end]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        words.push(w);
        end = start;
    }
    trim_key(words)
}

/// Drop most-significant zero words, keeping at least one word.
fn trim_key(mut words: Vec<u32>) -> Vec<u32> {
    while words.len() > 1 && words.last() == Some(&0) {
        words.pop();
    }
    if words.is_empty() {
        words.push(0);
    }
    words
}
