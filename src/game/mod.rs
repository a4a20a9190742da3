//! Mastermind rules and match orchestration.

pub mod engine;
pub mod record;
pub mod scoring;
pub mod validate;
