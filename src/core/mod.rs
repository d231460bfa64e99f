//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing. Nothing here reads the wall clock,
//! so a seed plus an input log always reproduces the same session.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, RandomSource};
pub use hash::{compute_state_hash, StateHash, StateHasher};
