// Startup validation for game settings and sandbox limits.
// A match must never start from settings it cannot honour, so errors are fatal
// and reported together; warnings are only logged.

use crate::config::types::{ArenaError, GameConfig, Result, SandboxLimits};
use crate::core::channel::MAX_FRAME_BYTES;
use std::collections::HashSet;
use std::time::Duration;

/// Search spaces above this size make exhaustive bots impractical.
const LARGE_SEARCH_SPACE: u128 = 10_000_000;

/// Envelope bytes around a code in the largest frame that carries one
/// (a `receive_feedback` request with both peg counts).
const CODE_FRAME_OVERHEAD: usize = 256;

/// Largest `max_turns` whose turn count still fits a match result.
pub const MAX_TURNS_LIMIT: u32 = i32::MAX as u32;

/// Upper bound on the size of any frame carrying a code of this shape.
/// `None` means the bound itself overflows.
pub fn worst_case_code_frame(config: &GameConfig) -> Option<usize> {
    let widest_token = config
        .code_colors
        .iter()
        .map(|c| serde_json::to_string(c).map_or(c.len() * 6 + 2, |json| json.len()))
        .max()
        .unwrap_or(2);
    config
        .code_length
        .checked_mul(widest_token + 1)?
        .checked_add(CODE_FRAME_OVERHEAD)
}

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate settings before a game is constructed.
pub fn validate_config(config: &GameConfig, limits: &SandboxLimits) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_colors(config, &mut result);
    validate_shape(config, &mut result);
    validate_limits(limits, &mut result);

    for warning in &result.warnings {
        log::warn!("settings warning: {}", warning);
    }

    if !result.is_valid() {
        return Err(ArenaError::Config(format!(
            "Settings validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_colors(config: &GameConfig, result: &mut ValidationResult) {
    if config.code_colors.is_empty() {
        result.add_error("code_colors cannot be empty".to_string());
        return;
    }

    if config.code_colors.iter().any(|c| c.is_empty()) {
        result.add_error("code_colors cannot contain empty tokens".to_string());
    }

    let distinct: HashSet<&str> = config.code_colors.iter().map(String::as_str).collect();
    if distinct.len() != config.code_colors.len() {
        result.add_warning(format!(
            "code_colors contains duplicates ({} tokens, {} distinct); duplicates skew the secret distribution",
            config.code_colors.len(),
            distinct.len()
        ));
    }
}

fn validate_shape(config: &GameConfig, result: &mut ValidationResult) {
    if config.code_length == 0 {
        result.add_error("code_length must be positive".to_string());
    }

    if config.max_turns == 0 {
        result.add_error("max_turns must be positive".to_string());
    } else if config.max_turns > MAX_TURNS_LIMIT {
        result.add_error(format!(
            "max_turns {} exceeds the limit of {}",
            config.max_turns, MAX_TURNS_LIMIT
        ));
    }

    if config.code_length > 0 {
        match worst_case_code_frame(config) {
            Some(bytes) if bytes <= MAX_FRAME_BYTES => {}
            _ => result.add_error(format!(
                "code_length {} does not fit the {} byte protocol frame limit",
                config.code_length, MAX_FRAME_BYTES
            )),
        }
    }

    if config.code_length > 0 && !config.code_colors.is_empty() {
        let space = (config.code_colors.len() as u128).checked_pow(config.code_length as u32);
        if space.map_or(true, |s| s > LARGE_SEARCH_SPACE) {
            result.add_warning(format!(
                "search space {}^{} is very large",
                config.code_colors.len(),
                config.code_length
            ));
        }
    }
}

fn validate_limits(limits: &SandboxLimits, result: &mut ValidationResult) {
    for (name, value) in [
        ("start_timeout", limits.start_timeout),
        ("call_timeout", limits.call_timeout),
        ("stop_timeout", limits.stop_timeout),
    ] {
        if value == Duration::ZERO {
            result.add_error(format!("{name} cannot be zero"));
        }
    }
}
