//! Deck Construction
//!
//! Picks the symbols in play, pairs them up and shuffles the result.
//! All randomness comes from the injected [`RandomSource`].

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::rng::RandomSource;
use crate::game::card::{Deck, Symbol};

/// Rejected deck or board configuration.
///
/// Raised before any session state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// More pairs requested than distinct symbols available.
    #[error("{requested} pairs requested but the pool only has {available} symbols")]
    NotEnoughSymbols { requested: usize, available: usize },

    /// Negative pair count.
    #[error("pair count must not be negative (got {0})")]
    NegativePairCount(i64),

    /// The same symbol appears twice in the pool.
    #[error("symbol {0} appears more than once in the pool")]
    DuplicateSymbol(Symbol),

    /// A hand-built deck where a symbol does not appear exactly twice.
    #[error("symbol {symbol} appears {count} times, expected 2")]
    UnpairedSymbol { symbol: Symbol, count: usize },

    /// Explicit pair count does not fill the grid.
    #[error("a {grid_dimension}x{grid_dimension} grid cannot hold {pair_count} pairs")]
    GridMismatch { grid_dimension: u32, pair_count: usize },

    /// Clock period of zero.
    #[error("clock period must be at least 1ms")]
    ZeroClockPeriod,
}

/// Choose `k` distinct pool entries without replacement.
///
/// Every k-subset is equally likely and the order of the result is the draw
/// order. The pool itself is left untouched.
pub fn pick_random<T, R>(pool: &[T], k: usize, rng: &mut R) -> Result<Vec<T>, ConfigurationError>
where
    T: Clone,
    R: RandomSource + ?Sized,
{
    if k > pool.len() {
        return Err(ConfigurationError::NotEnoughSymbols {
            requested: k,
            available: pool.len(),
        });
    }

    let mut remaining: Vec<T> = pool.to_vec();
    let mut picks = Vec::with_capacity(k);
    for _ in 0..k {
        let index = rng.next_index(remaining.len());
        picks.push(remaining.swap_remove(index));
    }
    Ok(picks)
}

/// Uniformly random permutation of `seq` (Fisher-Yates).
///
/// Walks from the last index down to 1, swapping each slot with a uniformly
/// chosen slot in `[0, index]`. Returns a new vector.
pub fn shuffle<T, R>(seq: &[T], rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: RandomSource + ?Sized,
{
    let mut shuffled = seq.to_vec();
    for index in (1..shuffled.len()).rev() {
        let other = rng.next_index(index + 1);
        shuffled.swap(index, other);
    }
    shuffled
}

/// Build a shuffled deck of `pair_count` pairs drawn from `pool`.
///
/// Ids are assigned after shuffling, so they reflect display position.
pub fn build_deck<R>(pool: &[Symbol], pair_count: usize, rng: &mut R) -> Result<Deck, ConfigurationError>
where
    R: RandomSource + ?Sized,
{
    ensure_distinct(pool)?;

    let picks = pick_random(pool, pair_count, rng)?;
    let doubled: Vec<Symbol> = picks.iter().chain(picks.iter()).cloned().collect();
    let deck = Deck::numbered(shuffle(&doubled, rng));

    debug!("Built deck of {} cards from a pool of {}", deck.len(), pool.len());
    Ok(deck)
}

/// Reject pools that repeat a symbol.
pub(crate) fn ensure_distinct(pool: &[Symbol]) -> Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();
    for symbol in pool {
        if !seen.insert(symbol) {
            return Err(ConfigurationError::DuplicateSymbol(symbol.clone()));
        }
    }
    Ok(())
}
