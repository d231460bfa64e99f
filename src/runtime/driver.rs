//! Game Task Driver
//!
//! Runs a [`GameStateMachine`] on its own tokio task. Commands arrive over
//! an mpsc channel and are applied one at a time; between commands the task
//! sleeps until the machine's next timer deadline. Virtual milliseconds are
//! measured from the instant the task was spawned.
//!
//! The task builds its own machine from a [`GameConfig`], so every session
//! begins at generation 0, virtual time 0 and a freshly seeded RNG. Every
//! applied command is recorded into an [`InputLog`] against that origin, so
//! a checkpoint can be replayed offline and compared hash for hash.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::core::hash::StateHash;
use crate::game::card::CardId;
use crate::game::deck::ConfigurationError;
use crate::game::events::GameEvent;
use crate::game::input::{Input, InputLog};
use crate::game::machine::{FlipOutcome, GameStateMachine};
use crate::game::state::SessionView;

/// Pending command capacity per game.
pub const COMMAND_BUFFER: usize = 64;

/// Events a slow subscriber may fall behind before it starts lagging.
pub const EVENT_BUFFER: usize = 256;

/// Runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The machine rejected the command's configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The game task is gone.
    #[error("Game task has shut down")]
    Closed,
}

/// Everything needed to verify a session offline.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    /// Seed and timed inputs so far
    pub log: InputLog,
    /// State hash at `log.end_ms`
    pub state_hash: StateHash,
    /// Read model at `log.end_ms`
    pub view: SessionView,
}

enum Command {
    Start(oneshot::Sender<Result<(), ConfigurationError>>),
    Reset(oneshot::Sender<()>),
    Flip(CardId, oneshot::Sender<FlipOutcome>),
    View(oneshot::Sender<SessionView>),
    Checkpoint(oneshot::Sender<Checkpoint>),
    Shutdown,
}

/// Cloneable handle to a running game task.
#[derive(Clone, Debug)]
pub struct GameHandle {
    session_id: Uuid,
    seed: u64,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<GameEvent>,
}

/// Spawn a game task playing `config`. Must be called inside a tokio runtime.
///
/// Fails before spawning anything if the configuration is invalid. The task
/// exits on [`GameHandle::shutdown`] or once every handle is dropped.
pub fn spawn_game(config: GameConfig) -> Result<GameHandle, RuntimeError> {
    let machine = GameStateMachine::new(config)?;
    let seed = machine.seed();
    let session_id = Uuid::new_v4();
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let events = event_tx.clone();
    tokio::spawn(async move {
        run_game_loop(session_id, machine, command_rx, events).await;
    });

    Ok(GameHandle {
        session_id,
        seed,
        commands: command_tx,
        events: event_tx,
    })
}

impl GameHandle {
    /// Id used in this session's log spans.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Seed of the session's deck RNG.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Deal a fresh deck and start playing.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        self.request(Command::Start).await??;
        Ok(())
    }

    /// Return the session to idle.
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.request(Command::Reset).await
    }

    /// Flip a card.
    pub async fn flip(&self, id: CardId) -> Result<FlipOutcome, RuntimeError> {
        self.request(|reply| Command::Flip(id, reply)).await
    }

    /// Current read model.
    pub async fn view(&self) -> Result<SessionView, RuntimeError> {
        self.request(Command::View).await
    }

    /// Input log, state hash and view as of now.
    pub async fn checkpoint(&self) -> Result<Checkpoint, RuntimeError> {
        self.request(Command::Checkpoint).await
    }

    /// Stop the game task. Further requests fail with `Closed`.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        reply_rx.await.map_err(|_| RuntimeError::Closed)
    }
}

// =============================================================================
// GAME LOOP
// =============================================================================

#[instrument(skip_all, fields(session = %session_id))]
async fn run_game_loop(
    session_id: Uuid,
    mut machine: GameStateMachine,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<GameEvent>,
) {
    let origin = Instant::now();
    let now_ms = || u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut log = InputLog::new(machine.seed());

    info!("Game task running (seed {})", machine.seed());

    loop {
        let deadline = machine
            .next_deadline_ms()
            .map(|due_ms| origin + Duration::from_millis(due_ms));

        tokio::select! {
            command = commands.recv() => {
                let now = now_ms();
                machine.advance_to_ms(now);
                publish(&mut machine, &events);

                match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => handle_command(&mut machine, &mut log, now, command),
                }
                publish(&mut machine, &events);
            }
            _ = wait_for(deadline) => {
                let now = now_ms();
                trace!("Timer deadline reached at {}ms", now);
                machine.advance_to_ms(now);
                publish(&mut machine, &events);
            }
        }
    }

    info!("Game task stopped after {} inputs", log.len());
}

fn handle_command(machine: &mut GameStateMachine, log: &mut InputLog, now: u64, command: Command) {
    match command {
        Command::Start(reply) => {
            let result = machine.start();
            if result.is_ok() {
                log.record(now, Input::Start);
            }
            let _ = reply.send(result);
        }
        Command::Reset(reply) => {
            machine.reset();
            log.record(now, Input::Reset);
            let _ = reply.send(());
        }
        Command::Flip(id, reply) => {
            let outcome = machine.flip(id);
            log.record(now, Input::Flip(id));
            let _ = reply.send(outcome);
        }
        Command::View(reply) => {
            let _ = reply.send(machine.view());
        }
        Command::Checkpoint(reply) => {
            log.mark(now);
            let checkpoint = Checkpoint {
                log: log.clone(),
                state_hash: machine.compute_hash(),
                view: machine.view(),
            };
            debug!("Checkpoint at {}ms with {} inputs", now, log.len());
            let _ = reply.send(checkpoint);
        }
        Command::Shutdown => {}
    }
}

fn publish(machine: &mut GameStateMachine, events: &broadcast::Sender<GameEvent>) {
    for event in machine.take_events() {
        // No subscribers is fine
        let _ = events.send(event);
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
