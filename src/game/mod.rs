//! Game Logic Module
//!
//! All game rules. Deterministic given a seed and timed inputs.
//!
//! ## Module Structure
//!
//! - `card`: Symbols, card ids and the dealt deck
//! - `deck`: Random selection, shuffling and deck building
//! - `scheduler`: Virtual-time one-shot and recurring tasks
//! - `state`: Session aggregate and read model
//! - `machine`: The state machine owning every transition
//! - `events`: Change notifications for presentation and replay
//! - `input`: Recorded commands and replay

pub mod card;
pub mod deck;
pub mod scheduler;
pub mod state;
pub mod machine;
pub mod events;
pub mod input;

// Re-export key types
pub use card::{Card, CardId, Deck, Symbol};
pub use deck::{build_deck, pick_random, shuffle, ConfigurationError};
pub use events::{GameEvent, GameEventData, WinResult};
pub use input::{replay, Input, InputLog, TimedInput};
pub use machine::{FlipOutcome, FlipRejection, GameStateMachine};
pub use state::{GameStatus, Session, SessionView};
