//! Game Configuration
//!
//! Board size, symbol pool, timings and seed. Loaded from JSON with every
//! field optional; anything missing falls back to the defaults below.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::game::card::Symbol;
use crate::game::deck::{ensure_distinct, ConfigurationError};
use crate::{CLOCK_PERIOD_MS, DEFAULT_GRID_DIMENSION, DEFAULT_SYMBOLS, RESOLVE_DELAY_MS};

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or wrong field types.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed but rejected.
    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Configuration for a game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Board side length; the default pair count fills the board
    pub grid_dimension: u32,
    /// Explicit pair count (signed so a negative value reaches validation)
    pub pair_count: Option<i64>,
    /// Symbol pool, no repeats
    pub symbols: Vec<Symbol>,
    /// Delay between completing a selection and resolving it
    pub resolve_delay_ms: u64,
    /// Elapsed-time clock period
    pub clock_period_ms: u64,
    /// RNG seed; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Return to idle right after the win event
    pub auto_reset_on_win: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_dimension: DEFAULT_GRID_DIMENSION,
            pair_count: None,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| Symbol::from(*s)).collect(),
            resolve_delay_ms: RESOLVE_DELAY_MS,
            clock_period_ms: CLOCK_PERIOD_MS,
            seed: None,
            auto_reset_on_win: false,
        }
    }
}

impl GameConfig {
    /// Config with a custom pool and pair count, other fields default.
    pub fn with_pool<I, S>(symbols: I, pair_count: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            pair_count: Some(pair_count),
            ..Self::default()
        }
    }

    /// Set the seed.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of cells on the board.
    pub fn cell_count(&self) -> u64 {
        let side = self.grid_dimension as u64;
        side * side
    }

    /// Effective pair count: explicit, or half the board.
    pub fn pair_count(&self) -> Result<usize, ConfigurationError> {
        match self.pair_count {
            Some(requested) if requested < 0 => Err(ConfigurationError::NegativePairCount(requested)),
            Some(requested) => {
                let pairs = requested as usize;
                if (pairs as u64).saturating_mul(2) > self.cell_count() {
                    return Err(ConfigurationError::GridMismatch {
                        grid_dimension: self.grid_dimension,
                        pair_count: pairs,
                    });
                }
                Ok(pairs)
            }
            None => Ok((self.cell_count() / 2) as usize),
        }
    }

    /// Check everything a deck build or clock start could trip over.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let pairs = self.pair_count()?;
        ensure_distinct(&self.symbols)?;
        if pairs > self.symbols.len() {
            return Err(ConfigurationError::NotEnoughSymbols {
                requested: pairs,
                available: self.symbols.len(),
            });
        }
        if self.clock_period_ms == 0 {
            return Err(ConfigurationError::ZeroClockPeriod);
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
