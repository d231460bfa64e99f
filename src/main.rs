//! Memory Match Demo
//!
//! Plays one session through the async runtime with a simple bot, then
//! replays the recorded inputs offline and checks both runs hash the same.
//!
//! Usage: `memory-match [config.json]`

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use memory_match::{
    GameConfig, GameEventData, GameHandle, GameStatus, VERSION,
    game::input::replay,
    spawn_game,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Memory Match v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_file(&path).with_context(|| format!("Loading {}", path))?,
        None => GameConfig::default(),
    };
    info!(
        "Board {}x{}, {} symbols, resolve delay {}ms",
        config.grid_dimension,
        config.grid_dimension,
        config.symbols.len(),
        config.resolve_delay_ms
    );

    demo_session(config).await
}

/// Play a session with the bot, then verify it by replay.
async fn demo_session(config: GameConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let game = spawn_game(config.clone())?;
    info!("RNG Seed: {}", game.seed());
    info!("Session ID: {}", game.session_id());

    let mut events = game.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.data {
                    GameEventData::ClockTicked { .. } => {}
                    GameEventData::Won(result) => info!("{}", result),
                    data => info!("[{:>6}ms] {:?}", event.at_ms, data),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Event logger skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    game.start().await?;
    play_bot(&game, Duration::from_millis(config.resolve_delay_ms + 100)).await?;

    let checkpoint = game.checkpoint().await?;
    game.shutdown().await;
    drop(game);
    let _ = logger.await;

    info!("=== Session Complete ===");
    info!("Status: {}", checkpoint.view.status);
    info!("Moves: {}", checkpoint.view.moves);
    info!("Elapsed: {}s", checkpoint.view.elapsed_seconds);
    info!("Inputs recorded: {}", checkpoint.log.len());
    info!("Live hash:   {}", hex::encode(checkpoint.state_hash));

    let (replayed, replay_events) = replay(&config, &checkpoint.log)?;
    let replay_hash = replayed.compute_hash();
    info!("Replay hash: {} ({} events)", hex::encode(replay_hash), replay_events.len());

    if replay_hash != checkpoint.state_hash {
        bail!("Replay diverged from the live session");
    }
    info!("Replay verified");

    Ok(())
}

/// Miss once on purpose, then clear the board pair by pair.
async fn play_bot(game: &GameHandle, settle: Duration) -> Result<()> {
    let view = game.view().await?;

    let miss = view
        .cards
        .iter()
        .skip(1)
        .find(|card| card.symbol != view.cards[0].symbol)
        .map(|card| (view.cards[0].id, card.id));
    if let Some((a, b)) = miss {
        game.flip(a).await?;
        game.flip(b).await?;
        tokio::time::sleep(settle).await;
    }

    for (i, card) in view.cards.iter().enumerate() {
        let partner = view.cards[i + 1..].iter().find(|other| other.symbol == card.symbol);
        if let Some(partner) = partner {
            game.flip(card.id).await?;
            game.flip(partner.id).await?;
            tokio::time::sleep(settle).await;
        }
    }

    let status = game.view().await?.status;
    if status != GameStatus::Won {
        warn!("Bot finished without winning (status {})", status);
    }
    Ok(())
}
