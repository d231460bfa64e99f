//! Game Events
//!
//! Change notifications produced by the state machine. Presentation layers
//! drain them (or subscribe through the runtime) instead of diffing state.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::game::card::CardId;

/// Final counters reported when the board is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    /// Accepted flips in the episode
    pub moves: u32,
    /// Clock ticks in the episode
    pub elapsed_seconds: u32,
}

impl fmt::Display for WinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "You won! Moves: {}, Time: {} seconds", self.moves, self.elapsed_seconds)
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// A fresh deck is dealt and the clock runs
    Started {
        card_count: u32,
    },

    /// A card was turned face-up
    CardFlipped {
        card: CardId,
        moves: u32,
    },

    /// Two face-up cards shared a symbol
    PairMatched {
        first: CardId,
        second: CardId,
        matched_count: u32,
    },

    /// Two face-up cards differed and were turned back
    PairMissed {
        first: CardId,
        second: CardId,
    },

    /// One clock period elapsed
    ClockTicked {
        elapsed_seconds: u32,
    },

    /// Every card is matched
    Won(WinResult),

    /// Session returned to idle
    Reset,
}

/// A game event stamped with virtual time and session generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Virtual time (ms) when the event occurred
    pub at_ms: u64,

    /// Generation of the episode that produced it
    pub generation: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(at_ms: u64, generation: u64, data: GameEventData) -> Self {
        Self { at_ms, generation, data }
    }

    /// Win result, if this is a win event.
    pub fn win_result(&self) -> Option<WinResult> {
        match self.data {
            GameEventData::Won(result) => Some(result),
            _ => None,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_message() {
        let result = WinResult { moves: 18, elapsed_seconds: 42 };
        assert_eq!(result.to_string(), "You won! Moves: 18, Time: 42 seconds");
    }

    #[test]
    fn test_win_result_accessor() {
        let result = WinResult { moves: 4, elapsed_seconds: 3 };
        let won = GameEvent::new(3000, 1, GameEventData::Won(result));
        let reset = GameEvent::new(3000, 1, GameEventData::Reset);

        assert_eq!(won.win_result(), Some(result));
        assert_eq!(reset.win_result(), None);
    }

    #[test]
    fn test_event_json_shape() {
        let event = GameEvent::new(
            1000,
            2,
            GameEventData::PairMissed { first: CardId(1), second: CardId(5) },
        );

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["at_ms"], 1000);
        assert_eq!(json["data"]["type"], "pair_missed");
        assert_eq!(json["data"]["second"], 5);
    }
}
