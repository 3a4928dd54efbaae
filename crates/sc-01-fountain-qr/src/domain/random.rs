//! # Deterministic Part Selection
//!
//! Both sides of a fountain transfer must agree on which fragments were
//! XOR-mixed into a part without sending the selection itself. The selection is
//! derived from a xoshiro256** generator seeded with
//! `SHA-256(seq_num_be || checksum_be)`.

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use sha2::{Digest, Sha256};

/// Generator seeded from an arbitrary byte string via SHA-256.
#[must_use]
pub fn seeded_rng(seed: &[u8]) -> Xoshiro256StarStar {
    let mut state = [0u8; 32];
    state.copy_from_slice(&Sha256::digest(seed));
    Xoshiro256StarStar::from_seed(state)
}

/// Uniform double in `[0, 1)`.
fn next_f64(rng: &mut impl RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Uniform integer in `[low, high]`.
fn next_in_range(rng: &mut impl RngCore, low: usize, high: usize) -> usize {
    debug_assert!(low <= high);
    let span = (high - low + 1) as f64;
    low + (next_f64(rng) * span) as usize
}

/// Pick a degree in `1..=seq_len` with probability proportional to `1/degree`.
fn choose_degree(rng: &mut impl RngCore, seq_len: usize) -> usize {
    let weights: Vec<f64> = (1..=seq_len).map(|i| 1.0 / i as f64).collect();
    let total: f64 = weights.iter().sum();

    let mut target = next_f64(rng) * total;
    for (i, weight) in weights.iter().enumerate() {
        if target < *weight {
            return i + 1;
        }
        target -= weight;
    }
    seq_len
}

/// Fragment indexes (0-based, sorted) mixed into part `seq_num`.
///
/// Parts `1..=seq_len` map to exactly one fragment each. Later parts select a
/// pseudo-random subset determined only by `seq_num` and `checksum`.
#[must_use]
pub fn choose_fragments(seq_num: u32, seq_len: usize, checksum: u32) -> Vec<usize> {
    if seq_len == 0 {
        return Vec::new();
    }
    if (seq_num as usize) >= 1 && (seq_num as usize) <= seq_len {
        return vec![seq_num as usize - 1];
    }

    let mut seed = [0u8; 8];
    seed[..4].copy_from_slice(&seq_num.to_be_bytes());
    seed[4..].copy_from_slice(&checksum.to_be_bytes());
    let mut rng = seeded_rng(&seed);

    let degree = choose_degree(&mut rng, seq_len);

    // Fisher-Yates shuffle, keeping the first `degree` indexes.
    let mut indexes: Vec<usize> = (0..seq_len).collect();
    for i in (1..seq_len).rev() {
        let j = next_in_range(&mut rng, 0, i);
        indexes.swap(i, j);
    }
    indexes.truncate(degree);
    indexes.sort_unstable();
    indexes
}
