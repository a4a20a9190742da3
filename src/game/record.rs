use serde::{Deserialize, Serialize};

/// Feedback for one guess: exact-position matches (`black`) and
/// color-only matches among the remaining positions (`white`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    pub black: usize,
    pub white: usize,
    pub guess: Vec<String>,
}

/// Identity a bot reports once at start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentInfo {
    pub name: String,
    pub author: String,
}

impl AgentInfo {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
        }
    }

    /// Placeholder for bots that fail before reporting. Built fresh on every call.
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

/// Final record of one match.
///
/// `turns_used` is `-1` when the bot never reached play (startup or
/// `agent_info` failure).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResult {
    pub turns_used: i32,
    pub outcome: Outcome,
    pub reason: String,
    pub secret: Vec<String>,
    pub history: Vec<Feedback>,
    pub agent_info: AgentInfo,
}

impl MatchResult {
    pub fn is_win(&self) -> bool {
        self.outcome == Outcome::Win
    }
}
