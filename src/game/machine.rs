//! Game State Machine
//!
//! Owns the session, the deck RNG and the timer queue, and is the only
//! place session state changes. Every entry point (`start`, `reset`,
//! `flip`, and the timer tasks fired by `advance`) runs to completion
//! before the next one, so no two mutations ever interleave.
//!
//! ## Timing
//!
//! - Completing a two-card selection schedules one `Resolve` task after
//!   `resolve_delay_ms`, carrying the session generation.
//! - `start` arms a recurring `ClockTick` every `clock_period_ms` in a
//!   [`TimerSlot`], which cancels any previous clock first.
//! - `start` and `reset` bump the generation and cancel both timers; a task
//!   that still fires with an old generation is discarded.

use std::time::Duration;

use serde::{Serialize, Deserialize};
use tracing::{debug, info, trace};

use crate::config::GameConfig;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::card::{CardId, Deck};
use crate::game::deck::{build_deck, ConfigurationError};
use crate::game::events::{GameEvent, GameEventData, WinResult};
use crate::game::scheduler::{Scheduler, TimerSlot};
use crate::game::state::{GameStatus, Session, SessionView};

/// The two cards of a completed selection, captured when it completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSnapshot {
    /// Session generation at schedule time
    pub generation: u64,
    /// First flipped card
    pub first: CardId,
    /// Second flipped card
    pub second: CardId,
}

/// Deferred work owned by the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Evaluate a completed selection
    Resolve(ResolveSnapshot),
    /// Advance the elapsed-time counter
    ClockTick { generation: u64 },
}

/// Why a flip was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipRejection {
    /// Session is idle or already won
    NotPlaying,
    /// Id is outside the deck
    UnknownCard,
    /// Two cards are already waiting to resolve
    SelectionFull,
    /// Card is already face-up in the selection
    AlreadySelected,
    /// Card belongs to a found pair
    AlreadyMatched,
}

/// Result of a flip request. Ignored flips are not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipOutcome {
    /// Card turned face-up; `completes_pair` when a resolve is now pending
    Accepted { completes_pair: bool },
    /// No-op
    Ignored(FlipRejection),
}

impl FlipOutcome {
    /// Whether the flip changed the session.
    pub fn is_accepted(&self) -> bool {
        matches!(self, FlipOutcome::Accepted { .. })
    }
}

/// Drives a single memory-match session.
pub struct GameStateMachine<R = DeterministicRng> {
    config: GameConfig,
    pair_count: usize,
    session: Session,
    rng: R,
    scheduler: Scheduler<TimerTask>,
    resolve_timer: TimerSlot,
    clock: TimerSlot,
    pending_events: Vec<GameEvent>,
}

impl GameStateMachine<DeterministicRng> {
    /// Create an idle machine. Seeds from `config.seed`, or from entropy.
    pub fn new(config: GameConfig) -> Result<Self, ConfigurationError> {
        let rng = match config.seed {
            Some(seed) => DeterministicRng::new(seed),
            None => DeterministicRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Seed of the deck RNG (for replays).
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }
}

impl<R: RandomSource> GameStateMachine<R> {
    /// Create an idle machine drawing decks from `rng`.
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let pair_count = config.pair_count()?;

        Ok(Self {
            config,
            pair_count,
            session: Session::new(),
            rng,
            scheduler: Scheduler::new(),
            resolve_timer: TimerSlot::new(),
            clock: TimerSlot::new(),
            pending_events: Vec::new(),
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Deal a fresh deck and begin playing. Valid from any status.
    ///
    /// Pool size, pair count and grid are already checked by
    /// [`GameStateMachine::new`] and [`GameStateMachine::with_rng`], so a
    /// machine built from a bad configuration never exists and this only
    /// fails if the deck cannot be built from the pool it was given. The
    /// deck is built before anything else happens, so an error leaves the
    /// session exactly as it was.
    pub fn start(&mut self) -> Result<(), ConfigurationError> {
        let deck = build_deck(&self.config.symbols, self.pair_count, &mut self.rng)?;
        self.begin(deck);
        Ok(())
    }

    /// Begin playing on a prepared deck.
    pub fn start_with(&mut self, deck: Deck) {
        self.begin(deck);
    }

    fn begin(&mut self, deck: Deck) {
        self.cancel_timers();
        self.session.generation += 1;
        self.session.deck = deck;
        self.session.clear_progress();
        self.session.status = GameStatus::Playing;

        let generation = self.session.generation;
        self.clock.arm_repeating(
            &mut self.scheduler,
            self.config.clock_period_ms,
            TimerTask::ClockTick { generation },
        );

        let card_count = self.session.deck.len() as u32;
        info!(
            "Session {} started with {} cards (deck {})",
            generation,
            card_count,
            hex::encode(&self.session.deck.fingerprint()[..4]),
        );
        self.emit(GameEventData::Started { card_count });
        self.check_invariants();
    }

    /// Return to idle, stopping the clock and any pending resolve.
    pub fn reset(&mut self) {
        self.cancel_timers();
        self.session.generation += 1;
        self.session.clear_progress();
        self.session.status = GameStatus::Idle;

        info!("Session reset (generation {})", self.session.generation);
        self.emit(GameEventData::Reset);
        self.check_invariants();
    }

    /// Turn a card face-up if the rules allow it; otherwise do nothing.
    pub fn flip(&mut self, id: CardId) -> FlipOutcome {
        if let Some(reason) = self.flip_rejection(id) {
            trace!("Ignoring flip of {}: {:?}", id, reason);
            return FlipOutcome::Ignored(reason);
        }

        self.session.selection.push(id);
        self.session.moves += 1;
        self.emit(GameEventData::CardFlipped {
            card: id,
            moves: self.session.moves,
        });

        let completes_pair = self.session.selection.len() == 2;
        if completes_pair {
            let snapshot = ResolveSnapshot {
                generation: self.session.generation,
                first: self.session.selection[0],
                second: self.session.selection[1],
            };
            self.resolve_timer.arm_once(
                &mut self.scheduler,
                self.config.resolve_delay_ms,
                TimerTask::Resolve(snapshot),
            );
        }

        self.check_invariants();
        FlipOutcome::Accepted { completes_pair }
    }

    fn flip_rejection(&self, id: CardId) -> Option<FlipRejection> {
        let session = &self.session;
        if session.status != GameStatus::Playing {
            Some(FlipRejection::NotPlaying)
        } else if !session.deck.contains(id) {
            Some(FlipRejection::UnknownCard)
        } else if session.selection.len() >= 2 {
            Some(FlipRejection::SelectionFull)
        } else if session.selection.contains(&id) {
            Some(FlipRejection::AlreadySelected)
        } else if session.matched.contains(&id) {
            Some(FlipRejection::AlreadyMatched)
        } else {
            None
        }
    }

    /// Evaluate a completed selection. Normally invoked by the scheduler.
    ///
    /// Snapshots from an earlier generation are discarded.
    pub fn resolve(&mut self, snapshot: ResolveSnapshot) {
        if snapshot.generation != self.session.generation {
            debug!(
                "Discarding stale resolve from generation {} (now {})",
                snapshot.generation, self.session.generation
            );
            return;
        }
        if self.session.status != GameStatus::Playing
            || self.session.selection != [snapshot.first, snapshot.second]
        {
            debug!("Discarding resolve for a selection that is no longer pending");
            return;
        }

        let deck = &self.session.deck;
        let is_pair = match (deck.symbol(snapshot.first), deck.symbol(snapshot.second)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };

        if is_pair {
            self.session.matched.insert(snapshot.first);
            self.session.matched.insert(snapshot.second);
            debug!("Matched {} and {}", snapshot.first, snapshot.second);
            self.emit(GameEventData::PairMatched {
                first: snapshot.first,
                second: snapshot.second,
                matched_count: self.session.matched.len() as u32,
            });
        } else {
            debug!("Missed {} and {}", snapshot.first, snapshot.second);
            self.emit(GameEventData::PairMissed {
                first: snapshot.first,
                second: snapshot.second,
            });
        }
        self.session.selection.clear();

        self.check_win();
        self.check_invariants();
    }

    /// Transition to `Won` once every card of a non-empty deck is matched.
    fn check_win(&mut self) {
        if self.session.status != GameStatus::Playing || !self.session.board_cleared() {
            return;
        }

        self.session.status = GameStatus::Won;
        self.clock.disarm(&mut self.scheduler);
        self.resolve_timer.disarm(&mut self.scheduler);

        let result = WinResult {
            moves: self.session.moves,
            elapsed_seconds: self.session.elapsed_seconds,
        };
        info!("Session {} won: {} moves in {}s", self.session.generation, result.moves, result.elapsed_seconds);
        self.emit(GameEventData::Won(result));

        if self.config.auto_reset_on_win {
            self.reset();
        }
    }

    fn tick_clock(&mut self, generation: u64) {
        if generation != self.session.generation || self.session.status != GameStatus::Playing {
            trace!("Dropping clock tick from generation {}", generation);
            return;
        }
        self.session.elapsed_seconds += 1;
        self.emit(GameEventData::ClockTicked {
            elapsed_seconds: self.session.elapsed_seconds,
        });
    }

    fn cancel_timers(&mut self) {
        self.clock.disarm(&mut self.scheduler);
        self.resolve_timer.disarm(&mut self.scheduler);
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Let `elapsed` of virtual time pass, firing due tasks in order.
    pub fn advance(&mut self, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let target = self.scheduler.now_ms().saturating_add(elapsed_ms);
        self.advance_to_ms(target);
    }

    /// Advance virtual time to `target_ms` (never backwards).
    pub fn advance_to_ms(&mut self, target_ms: u64) {
        while let Some(fired) = self.scheduler.pop_due(target_ms) {
            match fired.payload {
                TimerTask::Resolve(snapshot) => self.resolve(snapshot),
                TimerTask::ClockTick { generation } => self.tick_clock(generation),
            }
        }
        self.scheduler.advance_clock(target_ms);
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// When the next timer task is due, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.scheduler.next_deadline_ms()
    }

    /// Whether a completed selection is waiting to resolve.
    pub fn resolve_pending(&self) -> bool {
        self.resolve_timer.is_armed(&self.scheduler)
    }

    /// Whether the elapsed-time clock is running.
    pub fn clock_running(&self) -> bool {
        self.clock.is_armed(&self.scheduler)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// The session aggregate.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    /// Accepted flips this episode.
    pub fn moves(&self) -> u32 {
        self.session.moves
    }

    /// Clock ticks this episode.
    pub fn elapsed_seconds(&self) -> u32 {
        self.session.elapsed_seconds
    }

    /// Current deck.
    pub fn deck(&self) -> &Deck {
        &self.session.deck
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Hash of the full session, virtual clock and timers.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.session.generation, self.now_ms(), |hasher| {
            self.session.hash_into(hasher);
            hasher.update_bool(self.clock_running());
            hasher.update_bool(self.resolve_pending());
        })
    }

    /// Serializable snapshot for presentation layers.
    pub fn view(&self) -> SessionView {
        self.session.view_at(self.now_ms(), hex::encode(self.compute_hash()))
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn emit(&mut self, data: GameEventData) {
        let event = GameEvent::new(self.now_ms(), self.session.generation, data);
        self.pending_events.push(event);
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.session.invariant_violation().is_none(),
            "session invariant broken: {:?}",
            self.session.invariant_violation()
        );
        #[cfg(feature = "debug-tracing")]
        trace!(
            status = %self.session.status,
            moves = self.session.moves,
            elapsed = self.session.elapsed_seconds,
            selection = ?self.session.selection,
            matched = self.session.matched.len(),
            "session after transition"
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);

    fn machine() -> GameStateMachine {
        GameStateMachine::new(GameConfig::default().seeded(12345)).unwrap()
    }

    /// Machine playing on `A B A B`: pairs are (0,2) and (1,3).
    fn playing_abab() -> GameStateMachine {
        let mut game = machine();
        game.start_with(Deck::from_symbols(["A", "B", "A", "B"]).unwrap());
        game.take_events();
        game
    }

    fn event_kinds(game: &mut GameStateMachine) -> Vec<GameEventData> {
        game.take_events().into_iter().map(|event| event.data).collect()
    }

    #[test]
    fn test_new_machine_is_idle() {
        let game = machine();
        assert_eq!(game.status(), GameStatus::Idle);
        assert!(game.deck().is_empty());
        assert!(!game.clock_running());
        assert_eq!(game.seed(), 12345);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let result = GameStateMachine::new(GameConfig::with_pool(["A"], 2));
        assert!(matches!(result, Err(ConfigurationError::NotEnoughSymbols { .. })));
    }

    #[test]
    fn test_start_deals_default_board() {
        let mut game = machine();
        game.start().unwrap();

        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.deck().len(), 16);
        assert_eq!(game.moves(), 0);
        assert!(game.clock_running());
        assert_eq!(
            event_kinds(&mut game),
            vec![GameEventData::Started { card_count: 16 }]
        );
    }

    #[test]
    fn test_start_twice_deals_new_deck_and_one_clock() {
        let mut game = machine();
        game.start().unwrap();
        let first = game.deck().clone();
        game.start().unwrap();

        assert_ne!(&first, game.deck());
        game.advance(SECOND * 3);
        assert_eq!(game.elapsed_seconds(), 3);
    }

    #[test]
    fn test_flip_gated_when_idle() {
        let mut game = machine();

        assert_eq!(game.flip(CardId(0)), FlipOutcome::Ignored(FlipRejection::NotPlaying));
        assert_eq!(game.moves(), 0);
        assert!(game.session().selection().is_empty());
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn test_double_flip_counts_once() {
        let mut game = playing_abab();

        assert!(game.flip(CardId(0)).is_accepted());
        assert_eq!(
            game.flip(CardId(0)),
            FlipOutcome::Ignored(FlipRejection::AlreadySelected)
        );

        assert_eq!(game.moves(), 1);
        assert_eq!(game.session().selection(), &[CardId(0)]);
    }

    #[test]
    fn test_flip_unknown_card() {
        let mut game = playing_abab();
        assert_eq!(game.flip(CardId(4)), FlipOutcome::Ignored(FlipRejection::UnknownCard));
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_third_flip_waits_for_resolution() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        assert_eq!(game.flip(CardId(1)), FlipOutcome::Accepted { completes_pair: true });

        assert_eq!(game.flip(CardId(2)), FlipOutcome::Ignored(FlipRejection::SelectionFull));
        assert_eq!(game.moves(), 2);
        assert!(game.resolve_pending());
    }

    #[test]
    fn test_matching_pair_resolves_after_delay() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        game.flip(CardId(2));

        game.advance(Duration::from_millis(999));
        assert!(game.session().matched().is_empty());
        assert_eq!(game.session().selection().len(), 2);

        game.advance(Duration::from_millis(1));
        assert!(game.session().matched().contains(&CardId(0)));
        assert!(game.session().matched().contains(&CardId(2)));
        assert!(game.session().selection().is_empty());
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn test_mismatch_turns_cards_back() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        game.flip(CardId(1));
        game.advance(SECOND);

        assert!(game.session().matched().is_empty());
        assert!(game.session().selection().is_empty());
        assert!(event_kinds(&mut game).contains(&GameEventData::PairMissed {
            first: CardId(0),
            second: CardId(1),
        }));
    }

    #[test]
    fn test_matched_card_cannot_be_flipped() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        game.flip(CardId(2));
        game.advance(SECOND);

        assert_eq!(game.flip(CardId(2)), FlipOutcome::Ignored(FlipRejection::AlreadyMatched));
        assert_eq!(game.moves(), 2);
    }

    #[test]
    fn test_full_game_wins_with_final_counters() {
        let mut game = playing_abab();

        game.flip(CardId(0));
        game.flip(CardId(2));
        game.advance(SECOND);
        game.flip(CardId(1));
        game.flip(CardId(3));
        game.advance(SECOND);

        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.session().matched().len(), 4);
        assert!(!game.clock_running());

        let won: Vec<WinResult> = game.take_events().iter().filter_map(GameEvent::win_result).collect();
        // Clock ticks at 1s and 2s land before the resolves due at the same instant.
        assert_eq!(won, vec![WinResult { moves: 4, elapsed_seconds: 2 }]);

        // Clock is stopped: time no longer accumulates.
        game.advance(SECOND * 5);
        assert_eq!(game.elapsed_seconds(), 2);
        assert_eq!(game.flip(CardId(0)), FlipOutcome::Ignored(FlipRejection::NotPlaying));
    }

    #[test]
    fn test_two_symbol_pool_scenario() {
        let config = GameConfig::with_pool(["A", "B"], 2).seeded(8);
        let mut game = GameStateMachine::new(config).unwrap();
        game.start().unwrap();

        let pairs: Vec<Vec<CardId>> = game.deck().pairs().into_values().collect();
        assert_eq!(game.deck().len(), 4);
        assert_eq!(pairs.len(), 2);

        game.flip(pairs[0][0]);
        game.flip(pairs[0][1]);
        game.advance(SECOND);
        assert_eq!(game.session().matched().len(), 2);
        assert_eq!(game.moves(), 2);

        game.flip(pairs[1][0]);
        game.flip(pairs[1][1]);
        game.advance(SECOND);
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.moves(), 4);
    }

    #[test]
    fn test_auto_reset_on_win() {
        let mut config = GameConfig::default().seeded(1);
        config.auto_reset_on_win = true;
        let mut game = GameStateMachine::new(config).unwrap();
        game.start_with(Deck::from_symbols(["A", "A"]).unwrap());
        game.take_events();

        game.flip(CardId(0));
        game.flip(CardId(1));
        game.advance(SECOND);

        assert_eq!(game.status(), GameStatus::Idle);
        assert_eq!(game.moves(), 0);
        let kinds = event_kinds(&mut game);
        let tail = &kinds[kinds.len() - 2..];
        assert!(matches!(tail[0], GameEventData::Won(WinResult { moves: 2, .. })));
        assert_eq!(tail[1], GameEventData::Reset);
    }

    #[test]
    fn test_reset_is_total_from_every_status() {
        // Idle
        let mut game = machine();
        game.reset();
        assert_reset(&game);

        // Playing with a pending resolve and a running clock
        let mut game = playing_abab();
        game.advance(SECOND * 2);
        game.flip(CardId(0));
        game.flip(CardId(2));
        game.reset();
        assert_reset(&game);
        assert!(!game.clock_running());
        assert!(!game.resolve_pending());

        // Won
        let mut game = playing_abab();
        for (a, b) in [(0, 2), (1, 3)] {
            game.flip(CardId(a));
            game.flip(CardId(b));
            game.advance(SECOND);
        }
        assert_eq!(game.status(), GameStatus::Won);
        game.reset();
        assert_reset(&game);
    }

    fn assert_reset(game: &GameStateMachine) {
        assert_eq!(game.status(), GameStatus::Idle);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.elapsed_seconds(), 0);
        assert!(game.session().matched().is_empty());
        assert!(game.session().selection().is_empty());
    }

    #[test]
    fn test_reset_cancels_pending_resolve() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        game.flip(CardId(2));
        game.reset();
        game.start_with(Deck::from_symbols(["A", "B", "A", "B"]).unwrap());

        game.advance(SECOND * 2);

        assert!(game.session().matched().is_empty());
        assert_eq!(game.elapsed_seconds(), 2);
    }

    #[test]
    fn test_stale_snapshot_is_discarded() {
        let mut game = playing_abab();
        game.flip(CardId(0));
        game.flip(CardId(2));
        let stale = ResolveSnapshot {
            generation: game.session().generation(),
            first: CardId(0),
            second: CardId(2),
        };

        game.start_with(Deck::from_symbols(["A", "B", "A", "B"]).unwrap());
        game.flip(CardId(0));
        game.flip(CardId(2));
        game.resolve(stale);

        // The new episode's selection is untouched by the old callback.
        assert_eq!(game.session().selection(), &[CardId(0), CardId(2)]);
        assert!(game.session().matched().is_empty());
    }

    #[test]
    fn test_clock_does_not_stack_over_restarts() {
        let mut game = machine();
        for _ in 0..10 {
            game.start().unwrap();
            game.advance(Duration::from_millis(300));
            game.reset();
        }
        game.start().unwrap();

        game.advance(SECOND * 4);

        assert_eq!(game.elapsed_seconds(), 4);
        assert_eq!(game.next_deadline_ms(), Some(game.now_ms() + 1000));
    }

    #[test]
    fn test_advance_saturates_huge_durations() {
        let mut game = machine();
        game.advance(Duration::from_millis(5));

        // 2^64 seconds in ms does not fit in u64; the clock pins at the top.
        game.advance(Duration::from_secs(u64::MAX));

        assert_eq!(game.now_ms(), u64::MAX);
    }

    #[test]
    fn test_clock_counts_only_while_playing() {
        let mut game = machine();
        game.advance(SECOND * 3);
        assert_eq!(game.elapsed_seconds(), 0);

        game.start().unwrap();
        game.advance(SECOND * 3);
        assert_eq!(game.elapsed_seconds(), 3);

        game.reset();
        game.advance(SECOND * 3);
        assert_eq!(game.elapsed_seconds(), 0);
    }

    #[test]
    fn test_empty_deck_never_wins() {
        let mut game = GameStateMachine::new(GameConfig::with_pool(["A"], 0).seeded(4)).unwrap();
        game.start().unwrap();

        assert!(game.deck().is_empty());
        assert_eq!(game.flip(CardId(0)), FlipOutcome::Ignored(FlipRejection::UnknownCard));
        game.advance(SECOND * 2);

        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.elapsed_seconds(), 2);
    }

    #[test]
    fn test_failed_start_leaves_session_unchanged() {
        struct Exhausted;
        impl RandomSource for Exhausted {
            fn next_u64(&mut self) -> u64 {
                0
            }
        }

        let mut game = GameStateMachine::with_rng(GameConfig::default(), Exhausted).unwrap();
        game.start_with(Deck::from_symbols(["A", "A"]).unwrap());
        game.flip(CardId(0));
        let before = game.compute_hash();

        // Shrink the pool behind the machine's back so the next build fails.
        game.config.symbols.truncate(1);
        let err = game.start().unwrap_err();

        assert!(matches!(err, ConfigurationError::NotEnoughSymbols { .. }));
        assert_eq!(game.compute_hash(), before);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn test_events_are_stamped() {
        let mut game = playing_abab();
        game.advance(Duration::from_millis(1500));
        game.flip(CardId(3));

        let events = game.take_events();
        let flipped = events.last().unwrap();
        assert_eq!(flipped.at_ms, 1500);
        assert_eq!(flipped.generation, 1);
        assert_eq!(flipped.data, GameEventData::CardFlipped { card: CardId(3), moves: 1 });
    }

    #[test]
    fn test_same_seed_same_history() {
        let play = || {
            let mut game = GameStateMachine::new(GameConfig::default().seeded(77)).unwrap();
            game.start().unwrap();
            for id in [0, 5, 3, 3, 9, 12] {
                game.flip(CardId(id));
                game.advance(Duration::from_millis(600));
            }
            (game.compute_hash(), game.take_events())
        };

        assert_eq!(play(), play());
    }

    #[test]
    fn test_view_reflects_session() {
        let mut game = playing_abab();
        game.flip(CardId(1));
        let view = game.view();

        assert_eq!(view.status, GameStatus::Playing);
        assert_eq!(view.moves, 1);
        assert!(view.cards[1].face_up);
        assert!(!view.cards[0].face_up);
        assert_eq!(view.state_hash, hex::encode(game.compute_hash()));
    }
}
