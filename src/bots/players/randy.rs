use crate::bots::adapter::{Bot, BotSettings};
use crate::game::record::AgentInfo;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reference bot: guesses uniformly at random and ignores feedback.
#[derive(Debug, Clone)]
pub struct RandyBot {
    rng: ChaCha8Rng,
    code_colors: Vec<String>,
    code_length: usize,
}

impl RandyBot {
    pub fn new(settings: &BotSettings) -> anyhow::Result<Self> {
        if settings.code_colors.is_empty() {
            anyhow::bail!("randy needs at least one color");
        }
        let rng = match settings.bot_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            rng,
            code_colors: settings.code_colors.clone(),
            code_length: settings.code_length,
        })
    }
}

impl Bot for RandyBot {
    fn info(&self) -> anyhow::Result<AgentInfo> {
        Ok(AgentInfo::new("Randy Randolph", "Prof. Tallman"))
    }

    fn make_guess(&mut self) -> anyhow::Result<Vec<String>> {
        let guess = (0..self.code_length)
            .map(|_| self.code_colors[self.rng.gen_range(0..self.code_colors.len())].clone())
            .collect();
        Ok(guess)
    }
}
