//! Async runtime for a game session.
//!
//! Maps the machine's virtual clock onto tokio time. Not deterministic
//! itself, but every input it applies is recorded for replay.

pub mod driver;

pub use driver::{spawn_game, Checkpoint, GameHandle, RuntimeError};
