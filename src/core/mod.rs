//! Bot isolation core.
//!
//! Core owns the worker process model: forking, the private request channel,
//! the worker's serving loop, and the supervisor that bounds every call.

pub mod channel;
pub mod supervisor;
pub mod types;
pub mod worker;
