/// Core configuration types and the shared error type for the arena
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Seed used when a settings file does not provide `game_seed`.
pub const DEFAULT_GAME_SEED: u64 = 104;

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(1000);

const REQUIRED_SETTINGS: [&str; 3] = ["code_colors", "code_length", "max_turns"];

fn default_game_seed() -> u64 {
    DEFAULT_GAME_SEED
}

/// Game settings shared by the engine and handed (partially) to bots
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    /// Allowed color tokens, in order
    pub code_colors: Vec<String>,
    /// Number of tokens in the secret and in every guess
    pub code_length: usize,
    /// Maximum number of guesses before the match is lost
    pub max_turns: u32,
    /// Seed for the secret-code generator
    #[serde(default = "default_game_seed")]
    pub game_seed: u64,
    /// Seed handed to the bot; `None` lets the bot seed itself
    #[serde(default)]
    pub bot_seed: Option<u64>,
}

impl GameConfig {
    pub fn new(code_colors: &[&str], code_length: usize, max_turns: u32) -> Self {
        Self {
            code_colors: code_colors.iter().map(|c| c.to_string()).collect(),
            code_length,
            max_turns,
            game_seed: DEFAULT_GAME_SEED,
            bot_seed: None,
        }
    }

    pub fn with_game_seed(mut self, seed: u64) -> Self {
        self.game_seed = seed;
        self
    }

    pub fn with_bot_seed(mut self, seed: Option<u64>) -> Self {
        self.bot_seed = seed;
        self
    }

    /// Parse settings from a JSON document.
    /// Missing required keys are reported by name; `game_seed` falls back to
    /// [`DEFAULT_GAME_SEED`].
    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| ArenaError::Config(format!("invalid settings json: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| ArenaError::Config("settings must be a json object".to_string()))?;

        for key in REQUIRED_SETTINGS {
            if !object.contains_key(key) {
                return Err(ArenaError::Config(format!("Settings must specify '{key}'")));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| ArenaError::Config(format!("invalid settings: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ArenaError::Config(format!("failed to read settings {}: {e}", path.display()))
        })?;
        Self::from_json_str(&data)
    }
}

/// Wall-clock limits applied by the supervisor
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxLimits {
    /// How long a fresh worker may take to report readiness
    pub start_timeout: Duration,
    /// How long a single bot call may take
    pub call_timeout: Duration,
    /// Grace period for a worker to exit after a stop request
    pub stop_timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            start_timeout: DEFAULT_START_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// Error types for the arena
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    StartupTimeout(String),

    #[error("{0}")]
    StartupError(String),

    #[error("Bot '{bot}' timed out calling {method}()")]
    CallTimeout { bot: String, method: String },

    #[error("Bot '{bot}' error in {method}():\n{message}")]
    CallError {
        bot: String,
        method: String,
        message: String,
    },

    #[error("No such method: {0}")]
    NoSuchMethod(String),

    #[error("Invalid guess: {0}")]
    InvalidGuess(String),

    #[error("Bot process not started")]
    NotStarted,
}

impl ArenaError {
    /// Short fault label used when a supervisor fault ends a match.
    pub fn kind(&self) -> &'static str {
        match self {
            ArenaError::StartupTimeout(_) | ArenaError::CallTimeout { .. } => "timeout",
            ArenaError::InvalidGuess(_) => "forfeit",
            _ => "exception",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ArenaError::StartupTimeout(_) | ArenaError::CallTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ArenaError>;
