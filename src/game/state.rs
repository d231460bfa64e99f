//! Session State Definitions
//!
//! The single mutable aggregate of a game. Fields are only written by
//! `GameStateMachine`; everyone else reads through accessors or a
//! [`SessionView`]. Uses BTreeSet for deterministic iteration order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::game::card::{CardId, Deck, Symbol};

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle status of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// No episode running
    #[default]
    Idle,
    /// Cards may be flipped, clock running
    Playing,
    /// Every pair found
    Won,
}

impl GameStatus {
    fn code(self) -> u8 {
        match self {
            GameStatus::Idle => 0,
            GameStatus::Playing => 1,
            GameStatus::Won => 2,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameStatus::Idle => "idle",
            GameStatus::Playing => "playing",
            GameStatus::Won => "won",
        };
        f.write_str(name)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Complete state of a session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Session {
    pub(crate) status: GameStatus,
    pub(crate) moves: u32,
    pub(crate) elapsed_seconds: u32,
    /// Face-up cards awaiting resolution, in flip order (at most 2)
    pub(crate) selection: Vec<CardId>,
    pub(crate) matched: BTreeSet<CardId>,
    pub(crate) deck: Deck,
    /// Bumped by every start and reset; stale timer tasks compare against it
    pub(crate) generation: u64,
}

impl Session {
    /// Fresh idle session with an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Accepted flips this episode.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Clock ticks this episode.
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Cards flipped and pending resolution, in flip order.
    pub fn selection(&self) -> &[CardId] {
        &self.selection
    }

    /// Cards confirmed as pairs.
    pub fn matched(&self) -> &BTreeSet<CardId> {
        &self.matched
    }

    /// Current deck (stale while idle after a reset).
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Episode counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the card is showing its symbol.
    pub fn is_face_up(&self, id: CardId) -> bool {
        self.selection.contains(&id) || self.matched.contains(&id)
    }

    /// Whether every card of a non-empty deck is matched.
    pub fn board_cleared(&self) -> bool {
        !self.deck.is_empty() && self.matched.len() == self.deck.len()
    }

    /// Zero the counters and sets for a new episode (or for idle).
    pub(crate) fn clear_progress(&mut self) {
        self.moves = 0;
        self.elapsed_seconds = 0;
        self.selection.clear();
        self.matched.clear();
    }

    /// First broken invariant, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.selection.len() > 2 {
            return Some("selection holds more than two cards");
        }
        if self.selection.len() == 2 && self.selection[0] == self.selection[1] {
            return Some("selection repeats a card");
        }
        if self.selection.iter().any(|id| self.matched.contains(id)) {
            return Some("a selected card is already matched");
        }
        if self.matched.iter().any(|id| !self.deck.contains(*id)) {
            return Some("matched set names a card outside the deck");
        }
        if self.matched.len() % 2 != 0 {
            return Some("matched set has odd size");
        }
        if (self.status == GameStatus::Won) != self.board_cleared() {
            return Some("won status disagrees with the board");
        }
        None
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.status.code());
        hasher.update_u32(self.moves);
        hasher.update_u32(self.elapsed_seconds);

        hasher.update_u32(self.selection.len() as u32);
        for id in &self.selection {
            hasher.update_u32(id.0);
        }

        // BTreeSet iterates in sorted order
        hasher.update_u32(self.matched.len() as u32);
        for id in &self.matched {
            hasher.update_u32(id.0);
        }

        self.deck.hash_into(hasher);
    }

    /// Read model for presentation layers, stamped with time and hash.
    pub(crate) fn view_at(&self, now_ms: u64, state_hash: String) -> SessionView {
        let cards = self
            .deck
            .iter()
            .map(|card| CardView {
                id: card.id,
                symbol: card.symbol.clone(),
                face_up: self.is_face_up(card.id),
                matched: self.matched.contains(&card.id),
            })
            .collect();

        SessionView {
            status: self.status,
            moves: self.moves,
            elapsed_seconds: self.elapsed_seconds,
            generation: self.generation,
            selection: self.selection.clone(),
            cards,
            now_ms,
            state_hash,
        }
    }
}

// =============================================================================
// READ MODEL
// =============================================================================

/// One card as a renderer sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    /// Display position
    pub id: CardId,
    /// Face symbol (renderers hide it while face-down)
    pub symbol: Symbol,
    /// Selected or matched
    pub face_up: bool,
    /// Part of a found pair
    pub matched: bool,
}

/// Serializable snapshot of the whole session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Lifecycle status
    pub status: GameStatus,
    /// Accepted flips
    pub moves: u32,
    /// Clock ticks
    pub elapsed_seconds: u32,
    /// Episode counter
    pub generation: u64,
    /// Pending selection, in flip order
    pub selection: Vec<CardId>,
    /// Every card in display order
    pub cards: Vec<CardView>,
    /// Virtual time of the snapshot
    pub now_ms: u64,
    /// Hex state hash at `now_ms`
    pub state_hash: String,
}

impl SessionView {
    /// Ids of face-down cards (neither selected nor matched).
    pub fn face_down(&self) -> Vec<CardId> {
        self.cards.iter().filter(|card| !card.face_up).map(|card| card.id).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
