//! Player Input Recording and Replay
//!
//! Every command the runtime accepts is recorded with the virtual time it
//! arrived at. Together with the RNG seed that is enough to rebuild the
//! session exactly: decks, timer firings and events all follow from it.

use serde::{Serialize, Deserialize};

use crate::config::GameConfig;
use crate::core::rng::RandomSource;
use crate::game::card::CardId;
use crate::game::deck::ConfigurationError;
use crate::game::events::GameEvent;
use crate::game::machine::{FlipOutcome, GameStateMachine};

/// A player command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "card", rename_all = "snake_case")]
pub enum Input {
    /// Start (or restart) a session
    Start,
    /// Return to idle
    Reset,
    /// Turn a card face-up
    Flip(CardId),
}

impl Input {
    /// Apply to a machine. Returns the flip outcome for flips.
    pub fn apply<R: RandomSource>(
        self,
        machine: &mut GameStateMachine<R>,
    ) -> Result<Option<FlipOutcome>, ConfigurationError> {
        match self {
            Input::Start => machine.start().map(|_| None),
            Input::Reset => {
                machine.reset();
                Ok(None)
            }
            Input::Flip(id) => Ok(Some(machine.flip(id))),
        }
    }
}

/// An input stamped with the virtual time it was applied at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedInput {
    /// Virtual time (ms)
    pub at_ms: u64,
    /// The command
    pub input: Input,
}

/// Recorded session: seed, inputs in arrival order, and the final clock.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLog {
    /// Deck RNG seed
    pub seed: u64,
    /// Inputs in the order they were applied
    pub inputs: Vec<TimedInput>,
    /// Virtual time the recording covers
    pub end_ms: u64,
}

impl InputLog {
    /// Create an empty log for `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inputs: Vec::new(),
            end_ms: 0,
        }
    }

    /// Append an input. Timestamps must not go backwards.
    pub fn record(&mut self, at_ms: u64, input: Input) {
        let at_ms = at_ms.max(self.end_ms);
        self.inputs.push(TimedInput { at_ms, input });
        self.end_ms = at_ms;
    }

    /// Extend the covered time without adding an input.
    pub fn mark(&mut self, at_ms: u64) {
        self.end_ms = self.end_ms.max(at_ms);
    }

    /// Number of recorded inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Replay a recorded session.
///
/// Builds a fresh machine seeded from the log (overriding `config.seed`),
/// applies each input at its time and runs the clock to `end_ms`.
/// Returns the final machine and every event it produced.
pub fn replay(
    config: &GameConfig,
    log: &InputLog,
) -> Result<(GameStateMachine, Vec<GameEvent>), ConfigurationError> {
    let mut machine = GameStateMachine::new(config.clone().seeded(log.seed))?;
    let mut all_events = Vec::new();

    for timed in &log.inputs {
        machine.advance_to_ms(timed.at_ms);
        timed.input.apply(&mut machine)?;
        all_events.extend(machine.take_events());
    }

    machine.advance_to_ms(log.end_ms);
    all_events.extend(machine.take_events());

    Ok((machine, all_events))
}
