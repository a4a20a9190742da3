//! Match orchestration: secret generation, the turn loop, and result assembly.
//!
//! A match moves through `Initializing -> AwaitingInfo -> Playing -> Terminated`.
//! Every supervisor fault ends the match as a loss; nothing raised by the bot
//! escapes [`Game::run_match`].

use crate::bots::{BotRegistry, BotSettings};
use crate::config::types::{ArenaError, GameConfig, Result, SandboxLimits};
use crate::config::validator::validate_config;
use crate::core::supervisor::Supervisor;
use crate::core::types::BotMethod;
use crate::game::record::{AgentInfo, Feedback, MatchResult, Outcome};
use crate::game::scoring::score_feedback;
use crate::game::validate::validate_code;
use crate::observability::audit::{events, CorrelationIds};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::sync::Arc;

/// Where the turn loop currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Initializing,
    AwaitingInfo,
    Playing { turn: u32 },
    Terminated,
}

impl MatchPhase {
    /// Turn count recorded when the match ends in this phase.
    fn turns_used(self) -> i32 {
        match self {
            MatchPhase::Playing { turn } => i32::try_from(turn).unwrap_or(i32::MAX),
            _ => -1,
        }
    }
}

/// Loss reason for a fault surfaced by the supervisor.
pub fn fault_reason(err: &ArenaError) -> String {
    match err {
        ArenaError::StartupTimeout(_) | ArenaError::StartupError(_) => err.to_string(),
        _ => format!("{}: {}", err.kind(), err),
    }
}

/// Turn a `make_guess` result into a playable code. Anything else is a
/// forfeit ([`ArenaError::InvalidGuess`]).
pub fn decode_guess(value: Value, config: &GameConfig) -> Result<Vec<String>> {
    let guess: Vec<String> = serde_json::from_value(value)
        .map_err(|e| ArenaError::InvalidGuess(format!("not a code: {e}")))?;
    validate_code(&guess, config).into_result()?;
    Ok(guess)
}

/// Accumulates one match's state until its single point of termination.
struct MatchState {
    secret: Vec<String>,
    history: Vec<Feedback>,
    agent_info: AgentInfo,
    phase: MatchPhase,
}

impl MatchState {
    fn finish(&mut self, outcome: Outcome, reason: impl Into<String>) -> MatchResult {
        let turns_used = self.phase.turns_used();
        self.phase = MatchPhase::Terminated;
        MatchResult {
            turns_used,
            outcome,
            reason: reason.into(),
            secret: self.secret.clone(),
            history: std::mem::take(&mut self.history),
            agent_info: self.agent_info.clone(),
        }
    }
}

/// Game engine. Owns the settings and the secret-code generator; each call
/// to [`Game::run_match`] plays one full match against a fresh worker.
pub struct Game {
    config: GameConfig,
    limits: SandboxLimits,
    registry: Arc<BotRegistry>,
    rng: ChaCha8Rng,
}

impl Game {
    /// Build an engine with the default sandbox limits.
    pub fn new(config: GameConfig, registry: Arc<BotRegistry>) -> Result<Self> {
        Self::with_limits(config, registry, SandboxLimits::default())
    }

    /// Build an engine, rejecting settings that cannot produce a playable match.
    pub fn with_limits(
        config: GameConfig,
        registry: Arc<BotRegistry>,
        limits: SandboxLimits,
    ) -> Result<Self> {
        validate_config(&config, &limits)?;
        let rng = ChaCha8Rng::seed_from_u64(config.game_seed);
        Ok(Self {
            config,
            limits,
            registry,
            rng,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Draw the next secret: `code_length` colors, with replacement.
    pub fn rand_code(&mut self) -> Vec<String> {
        let colors = &self.config.code_colors;
        (0..self.config.code_length)
            .map(|_| colors[self.rng.gen_range(0..colors.len())].clone())
            .collect()
    }

    /// Play one match against `bot_name`. The worker is stopped before this
    /// returns, whatever the outcome.
    pub fn run_match(&mut self, bot_name: &str) -> MatchResult {
        let mut state = MatchState {
            secret: self.rand_code(),
            history: Vec::new(),
            agent_info: AgentInfo::unknown(),
            phase: MatchPhase::Initializing,
        };
        let mut correlation = CorrelationIds::new(bot_name);
        events::match_start(&correlation, self.config.code_length, self.config.max_turns);

        let mut supervisor = Supervisor::new(
            bot_name,
            BotSettings::from_config(&self.config),
            Arc::clone(&self.registry),
            self.limits,
        );

        let result = self.play(&mut supervisor, &mut state, &mut correlation);

        supervisor.stop();
        if let Some(report) = supervisor.last_kill_report() {
            if report.kill_sent {
                events::forced_kill(&correlation, report);
            }
        }
        events::match_end(
            &correlation,
            result.outcome.as_str(),
            &result.reason,
            result.turns_used,
        );
        result
    }

    fn play(
        &self,
        supervisor: &mut Supervisor,
        state: &mut MatchState,
        correlation: &mut CorrelationIds,
    ) -> MatchResult {
        if let Err(err) = supervisor.start() {
            let reason = fault_reason(&err);
            *correlation = correlation.clone().with_worker_pid(supervisor.worker_pid());
            events::startup_failure(correlation, &reason);
            return state.finish(Outcome::Loss, reason);
        }
        *correlation = correlation.clone().with_worker_pid(supervisor.worker_pid());
        events::worker_ready(correlation);

        state.phase = MatchPhase::AwaitingInfo;
        let info = supervisor
            .call_default(BotMethod::AgentInfo.as_str(), Vec::new())
            .and_then(|value| {
                serde_json::from_value::<AgentInfo>(value).map_err(|e| ArenaError::CallError {
                    bot: supervisor.bot_name().to_string(),
                    method: BotMethod::AgentInfo.as_str().to_string(),
                    message: format!("malformed agent info: {e}"),
                })
            });
        match info {
            Ok(info) => state.agent_info = info,
            Err(err) => {
                let reason = fault_reason(&err);
                events::startup_failure(correlation, &reason);
                return state.finish(Outcome::Loss, reason);
            }
        }

        for turn in 1..=self.config.max_turns {
            state.phase = MatchPhase::Playing { turn };

            let guess = match supervisor.call_default(BotMethod::MakeGuess.as_str(), Vec::new()) {
                Ok(value) => value,
                Err(err) => return self.call_fault(state, correlation, turn, &err),
            };

            let guess = match decode_guess(guess, &self.config) {
                Ok(guess) => guess,
                Err(err) => {
                    events::invalid_guess(correlation, turn, &err);
                    return state.finish(Outcome::Loss, "invalid code");
                }
            };

            let feedback = score_feedback(&state.secret, &guess);
            let black = feedback.black;
            let payload = match serde_json::to_value(&feedback) {
                Ok(payload) => payload,
                Err(e) => {
                    let err = ArenaError::Protocol(format!("failed to encode feedback: {e}"));
                    return self.call_fault(state, correlation, turn, &err);
                }
            };
            state.history.push(feedback);

            if let Err(err) = supervisor.call_default(BotMethod::ReceiveFeedback.as_str(), vec![payload]) {
                return self.call_fault(state, correlation, turn, &err);
            }

            if black == self.config.code_length {
                return state.finish(Outcome::Win, "guessed code");
            }
        }

        state.finish(Outcome::Loss, "exhausted turns")
    }

    fn call_fault(
        &self,
        state: &mut MatchState,
        correlation: &CorrelationIds,
        turn: u32,
        err: &ArenaError,
    ) -> MatchResult {
        let reason = fault_reason(err);
        events::call_fault(correlation, turn, err.is_timeout(), &reason);
        state.finish(Outcome::Loss, reason)
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("limits", &self.limits)
            .field("bots", &self.registry.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(seed: u64) -> Game {
        let config = GameConfig::new(&["R", "G", "B", "Y"], 4, 10).with_game_seed(seed);
        Game::new(config, Arc::new(BotRegistry::new())).unwrap()
    }

    #[test]
    fn secrets_are_reproducible_per_seed() {
        let mut a = game(7);
        let mut b = game(7);
        let first = a.rand_code();
        assert_eq!(first, b.rand_code());
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|c| a.config().code_colors.contains(c)));
    }

    #[test]
    fn invalid_settings_are_rejected_at_construction() {
        let config = GameConfig::new(&[], 4, 10);
        assert!(matches!(
            Game::new(config, Arc::new(BotRegistry::new())),
            Err(ArenaError::Config(_))
        ));
    }

    #[test]
    fn fault_reasons_carry_kind_and_message() {
        let timeout = ArenaError::CallTimeout {
            bot: "b".to_string(),
            method: "make_guess".to_string(),
        };
        assert_eq!(
            fault_reason(&timeout),
            "timeout: Bot 'b' timed out calling make_guess()"
        );

        let error = ArenaError::CallError {
            bot: "b".to_string(),
            method: "make_guess".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(
            fault_reason(&error),
            "exception: Bot 'b' error in make_guess():\nboom"
        );

        let startup = ArenaError::StartupTimeout("Bot 'b' failed to start in time".to_string());
        assert_eq!(fault_reason(&startup), "Bot 'b' failed to start in time");
    }

    #[test]
    fn turns_used_is_negative_before_play() {
        assert_eq!(MatchPhase::Initializing.turns_used(), -1);
        assert_eq!(MatchPhase::AwaitingInfo.turns_used(), -1);
        assert_eq!(MatchPhase::Playing { turn: 5 }.turns_used(), 5);
    }

    #[test]
    fn turn_counts_never_wrap_negative() {
        assert_eq!(
            MatchPhase::Playing { turn: u32::MAX }.turns_used(),
            i32::MAX
        );
    }

    #[test]
    fn bad_guesses_are_forfeits() {
        let config = GameConfig::new(&["R", "G"], 2, 10);

        let guess = decode_guess(serde_json::json!(["R", "G"]), &config).unwrap();
        assert_eq!(guess, vec!["R".to_string(), "G".to_string()]);

        for (value, detail) in [
            (serde_json::json!(["R"]), "wrong length"),
            (serde_json::json!(["R", "X"]), "invalid color symbol"),
            (serde_json::json!("RG"), "not a code"),
            (serde_json::json!([1, 2]), "not a code"),
        ] {
            let err = decode_guess(value, &config).unwrap_err();
            assert!(matches!(err, ArenaError::InvalidGuess(_)), "{err:?}");
            assert_eq!(err.kind(), "forfeit");
            assert!(err.to_string().contains(detail), "{err}");
        }
    }

    #[test]
    fn unknown_bot_is_a_startup_loss() {
        let mut game = game(1);
        let result = game.run_match("ghost");
        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.turns_used, -1);
        assert!(result.reason.contains("not found in registry"), "{}", result.reason);
        assert_eq!(result.agent_info, AgentInfo::unknown());
        assert!(result.history.is_empty());
        assert_eq!(result.secret.len(), 4);
    }
}
