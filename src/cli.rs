use crate::bots::BotRegistry;
use crate::config::presets::{self, PRESET_NAMES};
use crate::config::types::{GameConfig, SandboxLimits};
use crate::game::engine::Game;
use crate::game::record::{AgentInfo, MatchResult};
use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play Mastermind against a sandboxed bot", long_about = None)]
struct Cli {
    /// Registered bot name (see --list-bots)
    bot: Option<String>,
    /// Number of matches to play
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    trials: u32,
    /// JSON settings file (code_colors, code_length, max_turns, game_seed, bot_seed)
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    config: Option<PathBuf>,
    /// Built-in settings preset
    #[arg(long, value_name = "NAME", default_value = "classic")]
    preset: String,
    /// Override the secret-code seed
    #[arg(long)]
    game_seed: Option<u64>,
    /// Seed handed to the bot
    #[arg(long)]
    bot_seed: Option<u64>,
    /// Per-call timeout in milliseconds
    #[arg(long, value_name = "MS")]
    call_timeout_ms: Option<u64>,
    /// Startup timeout in milliseconds
    #[arg(long, value_name = "MS")]
    start_timeout_ms: Option<u64>,
    /// Emit results as JSON
    #[arg(long)]
    json: bool,
    /// List registered bots and exit
    #[arg(long)]
    list_bots: bool,
}

/// Aggregate over a batch of matches. Losses count as `max_turns`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub agent_info: AgentInfo,
    pub trials: usize,
    pub wins: usize,
    pub total_turns: u64,
    pub average_turns: f64,
}

pub fn summarize(results: &[MatchResult], max_turns: u32) -> Summary {
    let total_turns: u64 = results
        .iter()
        .map(|r| {
            if r.is_win() {
                r.turns_used.max(0) as u64
            } else {
                max_turns as u64
            }
        })
        .sum();
    let trials = results.len();
    Summary {
        agent_info: results
            .last()
            .map(|r| r.agent_info.clone())
            .unwrap_or_else(AgentInfo::unknown),
        trials,
        wins: results.iter().filter(|r| r.is_win()).count(),
        total_turns,
        average_turns: if trials == 0 {
            0.0
        } else {
            total_turns as f64 / trials as f64
        },
    }
}

fn format_code(code: &[String]) -> String {
    format!("[{}]", code.join(", "))
}

/// Full transcript of a single match.
pub fn render_game(result: &MatchResult) -> String {
    let mut out = String::new();
    let secret = format_code(&result.secret);
    out.push_str(&format!(
        "{} by {}\n",
        result.agent_info.name, result.agent_info.author
    ));
    out.push_str(&format!("Secret Code: {}\n", secret));
    let width = secret.len();
    out.push_str(&format!("{:^width$} : B W\n", " -=| GUESSES |=- ", width = width));
    for feedback in &result.history {
        out.push_str(&format!(
            "{:<width$} : {} {}\n",
            format_code(&feedback.guess),
            feedback.black,
            feedback.white,
            width = width
        ));
    }
    out.push_str(&format!(
        "Result: {} ({}) after {} turn(s)\n",
        result.outcome.as_str(),
        result.reason,
        result.turns_used
    ));
    out
}

pub fn render_summary(summary: &Summary) -> String {
    format!(
        "\n==== MASTERMIND RESULTS ====\nBot: {} by {}\nTotal Trials: {}\nWins: {}\nAverage Turns: {:.2}\n",
        summary.agent_info.name,
        summary.agent_info.author,
        summary.trials,
        summary.wins,
        summary.average_turns
    )
}

fn load_settings(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => presets::preset(&cli.preset).ok_or_else(|| {
            anyhow!(
                "unknown preset '{}' (available: {})",
                cli.preset,
                PRESET_NAMES.join(", ")
            )
        })?,
    };
    if let Some(seed) = cli.game_seed {
        config = config.with_game_seed(seed);
    }
    if cli.bot_seed.is_some() {
        config = config.with_bot_seed(cli.bot_seed);
    }
    Ok(config)
}

fn load_limits(cli: &Cli) -> SandboxLimits {
    let mut limits = SandboxLimits::default();
    if let Some(ms) = cli.call_timeout_ms {
        limits.call_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.start_timeout_ms {
        limits.start_timeout = Duration::from_millis(ms);
    }
    limits
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let registry = Arc::new(BotRegistry::with_builtin());

    if cli.list_bots {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let bot = cli
        .bot
        .clone()
        .ok_or_else(|| anyhow!("missing bot name (see --list-bots)"))?;
    if !registry.contains(&bot) {
        return Err(anyhow!(
            "bot '{}' does not exist (available: {})",
            bot,
            registry.names().join(", ")
        ));
    }

    let config = load_settings(&cli)?;
    let max_turns = config.max_turns;
    let mut game = Game::with_limits(config, Arc::clone(&registry), load_limits(&cli))?;
    log::info!("playing {} trial(s) against '{}'", cli.trials, bot);

    let mut results = Vec::with_capacity(cli.trials as usize);
    for _ in 0..cli.trials {
        let result = game.run_match(&bot);
        if !cli.json && !result.is_win() {
            eprintln!("Error: Bot forfeited game due to '{}'", result.reason);
        }
        results.push(result);
    }
    let summary = summarize(&results, max_turns);

    if cli.json {
        let report = serde_json::json!({
            "bot": bot,
            "summary": summary,
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let [only] = results.as_slice() {
        print!("{}", render_game(only));
    }
    print!("{}", render_summary(&summary));
    Ok(())
}
