use crate::bots::adapter::{Bot, BotSettings};
use crate::game::record::{AgentInfo, Feedback};
use crate::game::scoring::score_feedback;

/// Largest candidate set the sweeper is willing to enumerate.
const MAX_CANDIDATES: usize = 1_000_000;

/// Deterministic bot that keeps every code still consistent with the
/// feedback received so far and always plays the first one.
#[derive(Debug, Clone)]
pub struct SweeperBot {
    candidates: Vec<Vec<String>>,
}

impl SweeperBot {
    pub fn new(settings: &BotSettings) -> anyhow::Result<Self> {
        let colors = settings.code_colors.len();
        if colors == 0 || settings.code_length == 0 {
            anyhow::bail!("sweeper needs a non-empty board");
        }
        let size = u32::try_from(settings.code_length)
            .ok()
            .and_then(|len| colors.checked_pow(len))
            .filter(|size| *size <= MAX_CANDIDATES)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "search space {}^{} is too large to sweep",
                    colors,
                    settings.code_length
                )
            })?;

        let mut candidates = Vec::with_capacity(size);
        for mut index in 0..size {
            let mut code = Vec::with_capacity(settings.code_length);
            for _ in 0..settings.code_length {
                code.push(settings.code_colors[index % colors].clone());
                index /= colors;
            }
            code.reverse();
            candidates.push(code);
        }

        Ok(Self { candidates })
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }
}

impl Bot for SweeperBot {
    fn info(&self) -> anyhow::Result<AgentInfo> {
        Ok(AgentInfo::new("Sweeper", "mastermind-box"))
    }

    fn make_guess(&mut self) -> anyhow::Result<Vec<String>> {
        self.candidates
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no candidate is consistent with the feedback"))
    }

    fn receive_feedback(&mut self, feedback: &Feedback) -> anyhow::Result<()> {
        self.candidates.retain(|candidate| {
            let fb = score_feedback(candidate, &feedback.guess);
            fb.black == feedback.black && fb.white == feedback.white
        });
        Ok(())
    }
}
