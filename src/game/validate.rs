use crate::config::types::{ArenaError, GameConfig, Result};

/// Outcome of checking a guess against the game settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessValidation {
    Valid,
    WrongLength,
    InvalidColor,
}

impl GuessValidation {
    pub fn is_valid(self) -> bool {
        self == GuessValidation::Valid
    }

    pub fn reason(self) -> &'static str {
        match self {
            GuessValidation::Valid => "valid code",
            GuessValidation::WrongLength => "wrong length",
            GuessValidation::InvalidColor => "invalid color symbol",
        }
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ArenaError::InvalidGuess(self.reason().to_string()))
        }
    }
}

/// Check length first, then the alphabet.
pub fn validate_code(code: &[String], config: &GameConfig) -> GuessValidation {
    if code.len() != config.code_length {
        return GuessValidation::WrongLength;
    }
    if code.iter().any(|token| !config.code_colors.contains(token)) {
        return GuessValidation::InvalidColor;
    }
    GuessValidation::Valid
}
