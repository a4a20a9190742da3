//! Observability
//!
//! Structured audit events for match lifecycle visibility.

pub mod audit;
