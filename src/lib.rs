//! mastermind-box: a Mastermind match engine that runs untrusted bots in
//! isolated worker processes
//!
//! # Architecture
//!
//! ## Isolation Core ([`core`])
//! - [`core::supervisor`]: Worker lifecycle (fork, readiness, bounded calls, kill)
//! - [`core::worker`]: Serving loop executed inside the forked worker
//! - [`core::channel`]: Newline-delimited JSON framing over a private socket pair
//! - [`core::types`]: Wire envelopes and kill reports
//!
//! ## Process Primitives ([`kernel`])
//! - [`kernel::process`]: Process groups, parent-death signal, SIGKILL and reaping
//!
//! ## Game ([`game`])
//! - [`game::engine`]: Turn loop state machine and result assembly
//! - [`game::scoring`]: Black/white peg feedback
//! - [`game::validate`]: Guess validation
//! - [`game::record`]: Feedback, agent info and match result records
//!
//! ## Bots ([`bots`])
//! - [`bots::adapter`]: The `Bot` capability contract
//! - [`bots::registry`]: Name to constructor registry resolved inside the worker
//! - [`bots::players`]: Built-in bots
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Settings, sandbox limits and the crate error type
//! - [`config::validator`]: Settings validation
//! - [`config::presets`]: Named game presets
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: Structured, correlated match events
//!
//! ## Utilities ([`utils`])
//! - [`utils::fd_closure`]: Inherited descriptor cleanup in forked workers
//!
//! # Design Principles
//!
//! 1. **Faults stay in the worker** - A bot error or panic becomes a failure
//!    response, never a supervisor crash
//! 2. **Non-cooperative cancellation** - A call that overruns its deadline gets
//!    its worker killed, not asked to unwind
//! 3. **One worker per match** - No state crosses match boundaries

pub mod bots;
pub mod cli;
pub mod config;
pub mod core;
pub mod game;
pub mod kernel;
pub mod observability;
pub mod utils;

pub use bots::{Bot, BotRegistry, BotSettings};
pub use config::types::{ArenaError, GameConfig, Result, SandboxLimits};
pub use crate::core::supervisor::Supervisor;
pub use game::engine::Game;
pub use game::record::{AgentInfo, Feedback, MatchResult, Outcome};
