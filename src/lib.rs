//! # Memory Match
//!
//! Game core for a single-player memory tile-matching game: deal a shuffled
//! board of paired symbols, flip two cards at a time, keep the pairs that
//! match, and win once the board is cleared.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MEMORY MATCH                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Board, pool, timings, seed               │
//! │                                                             │
//! │  core/           - Deterministic primitives                 │
//! │  ├── rng.rs      - Seeded Xorshift128+ and RandomSource     │
//! │  └── hash.rs     - State hashing for replay checks          │
//! │                                                             │
//! │  game/           - Game rules (deterministic)               │
//! │  ├── card.rs     - Symbols, card ids, deck                  │
//! │  ├── deck.rs     - pick_random, shuffle, build_deck         │
//! │  ├── scheduler.rs- Virtual-time timer queue                 │
//! │  ├── state.rs    - Session aggregate and view               │
//! │  ├── machine.rs  - start / reset / flip / resolve / win     │
//! │  ├── events.rs   - Change notifications                     │
//! │  └── input.rs    - Input log and replay                     │
//! │                                                             │
//! │  runtime/        - Tokio driver (wall clock)                │
//! │  └── driver.rs   - Game task, handle, event broadcast       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the wall clock. Timers run
//! on virtual milliseconds advanced by the owner, randomness comes from a
//! seeded source, and all sets are ordered. Given the same seed and the
//! same timed inputs, a session produces identical events and state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod runtime;

// Re-export commonly used types
pub use config::{ConfigError, GameConfig};
pub use core::rng::{DeterministicRng, RandomSource};
pub use game::card::{CardId, Deck, Symbol};
pub use game::deck::ConfigurationError;
pub use game::events::{GameEvent, GameEventData, WinResult};
pub use game::machine::{FlipOutcome, FlipRejection, GameStateMachine};
pub use game::state::{GameStatus, SessionView};
pub use runtime::{spawn_game, GameHandle, RuntimeError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default board side length (4x4 board, 8 pairs)
pub const DEFAULT_GRID_DIMENSION: u32 = 4;

/// Delay before a completed selection is resolved (ms)
pub const RESOLVE_DELAY_MS: u64 = 1000;

/// Elapsed-time clock period (ms)
pub const CLOCK_PERIOD_MS: u64 = 1000;

/// Default symbol pool
pub const DEFAULT_SYMBOLS: [&str; 10] = ["🥔", "🍒", "🥑", "🌽", "🥕", "🍇", "🍉", "🍌", "🥭", "🍍"];
