use crate::config::types::GameConfig;
use crate::game::record::{AgentInfo, Feedback};
use serde::{Deserialize, Serialize};

/// Settings a bot is constructed with. The secret and the engine's seed are
/// never part of it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotSettings {
    pub bot_seed: Option<u64>,
    pub code_colors: Vec<String>,
    pub code_length: usize,
}

impl BotSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            bot_seed: config.bot_seed,
            code_colors: config.code_colors.clone(),
            code_length: config.code_length,
        }
    }
}

/// Capability contract for guessing bots. Bots run inside a worker process
/// and are only ever reached through the worker protocol.
pub trait Bot: Send {
    fn info(&self) -> anyhow::Result<AgentInfo>;
    fn make_guess(&mut self) -> anyhow::Result<Vec<String>>;
    fn receive_feedback(&mut self, _feedback: &Feedback) -> anyhow::Result<()> {
        Ok(())
    }
}
