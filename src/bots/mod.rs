//! Bots.
//!
//! The worker resolves a bot by name in a [`registry::BotRegistry`] and
//! drives it through the [`adapter::Bot`] capability contract.

pub mod adapter;
pub mod players;
pub mod registry;

pub use adapter::{Bot, BotSettings};
pub use registry::{BotConstructor, BotRegistry};
