/// Match event logging for the arena
/// Provides structured, correlated records of every match lifecycle step
///
/// Each event is emitted twice: a human-readable line on the crate's normal
/// log target, and a single JSON object on the `audit` target so it can be
/// filtered with `RUST_LOG=audit=info`.
use crate::config::types::ArenaError;
use crate::core::types::KillReport;
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Log target for JSON audit lines
pub const AUDIT_TARGET: &str = "audit";

/// Event severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchSeverity {
    High,
    Medium,
    Low,
}

/// Types of match events we track
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchEventType {
    MatchStart,
    WorkerReady,
    StartupFailure,
    CallTimeout,
    CallFailure,
    InvalidGuess,
    ForcedKill,
    MatchEnd,
}

impl MatchEventType {
    /// Get the default severity for this event type
    pub fn default_severity(&self) -> MatchSeverity {
        match self {
            MatchEventType::MatchStart
            | MatchEventType::WorkerReady
            | MatchEventType::MatchEnd => MatchSeverity::Low,
            MatchEventType::CallFailure | MatchEventType::InvalidGuess => MatchSeverity::Medium,
            MatchEventType::StartupFailure
            | MatchEventType::CallTimeout
            | MatchEventType::ForcedKill => MatchSeverity::High,
        }
    }
}

/// Correlation identifiers carried by every event of one match
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrelationIds {
    /// Unique match identifier
    pub match_id: String,
    /// Registry name of the bot under test
    pub bot: String,
    /// Worker pid once forked
    pub worker_pid: Option<i32>,
}

impl CorrelationIds {
    pub fn new(bot: &str) -> Self {
        Self {
            match_id: Uuid::new_v4().to_string(),
            bot: bot.to_string(),
            worker_pid: None,
        }
    }

    pub fn with_worker_pid(mut self, pid: Option<i32>) -> Self {
        self.worker_pid = pid;
        self
    }
}

/// Individual match event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    pub event_type: MatchEventType,
    pub severity: MatchSeverity,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub details: String,
    pub correlation: CorrelationIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kill_report: Option<KillReport>,
}

impl MatchEvent {
    pub fn new(event_type: MatchEventType, correlation: &CorrelationIds, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: Utc::now().to_rfc3339(),
            details,
            correlation: correlation.clone(),
            turn: None,
            kill_report: None,
        }
    }

    pub fn with_turn(mut self, turn: u32) -> Self {
        self.turn = Some(turn);
        self
    }

    pub fn with_kill_report(mut self, report: Option<KillReport>) -> Self {
        self.kill_report = report;
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!(null))
    }
}

/// Log a match event on both the normal and the audit target
pub fn log_match_event(event: MatchEvent) {
    match event.severity {
        MatchSeverity::High => warn!(
            "MATCH {:?} [{}]: {}",
            event.event_type, event.correlation.match_id, event.details
        ),
        MatchSeverity::Medium | MatchSeverity::Low => info!(
            "MATCH {:?} [{}]: {}",
            event.event_type, event.correlation.match_id, event.details
        ),
    }

    match serde_json::to_string(&event) {
        Ok(line) => info!(target: AUDIT_TARGET, "{}", line),
        Err(e) => error!("Failed to encode audit event: {}", e),
    }
}

/// Convenience functions for common match events
pub mod events {
    use super::*;

    pub fn match_start(correlation: &CorrelationIds, code_length: usize, max_turns: u32) {
        log_match_event(MatchEvent::new(
            MatchEventType::MatchStart,
            correlation,
            format!(
                "Match started: bot={}, code_length={}, max_turns={}",
                correlation.bot, code_length, max_turns
            ),
        ));
    }

    pub fn worker_ready(correlation: &CorrelationIds) {
        log_match_event(MatchEvent::new(
            MatchEventType::WorkerReady,
            correlation,
            format!("Worker ready: pid={:?}", correlation.worker_pid),
        ));
    }

    pub fn startup_failure(correlation: &CorrelationIds, reason: &str) {
        log_match_event(MatchEvent::new(
            MatchEventType::StartupFailure,
            correlation,
            reason.to_string(),
        ));
    }

    pub fn call_fault(correlation: &CorrelationIds, turn: u32, timed_out: bool, reason: &str) {
        let event_type = if timed_out {
            MatchEventType::CallTimeout
        } else {
            MatchEventType::CallFailure
        };
        log_match_event(
            MatchEvent::new(event_type, correlation, reason.to_string()).with_turn(turn),
        );
    }

    pub fn invalid_guess(correlation: &CorrelationIds, turn: u32, err: &ArenaError) {
        log_match_event(
            MatchEvent::new(
                MatchEventType::InvalidGuess,
                correlation,
                format!("{}: {}", err.kind(), err),
            )
            .with_turn(turn),
        );
    }

    pub fn forced_kill(correlation: &CorrelationIds, report: &KillReport) {
        log_match_event(
            MatchEvent::new(
                MatchEventType::ForcedKill,
                correlation,
                format!(
                    "Worker killed: group_kill={}, reaped={}, waited_ms={}",
                    report.group_kill, report.reaped, report.waited_ms
                ),
            )
            .with_kill_report(Some(report.clone())),
        );
    }

    pub fn match_end(correlation: &CorrelationIds, outcome: &str, reason: &str, turns_used: i32) {
        log_match_event(MatchEvent::new(
            MatchEventType::MatchEnd,
            correlation,
            format!(
                "Match ended: outcome={}, reason={}, turns_used={}",
                outcome, reason, turns_used
            ),
        ));
    }
}
