//! Configuration & Policy
//!
//! - [`types`]: game settings, sandbox limits and the shared error type
//! - [`validator`]: fail-fast validation of settings
//! - [`presets`]: named game presets

pub mod presets;
pub mod types;
pub mod validator;
