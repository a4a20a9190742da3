//! Utilities
//!
//! FD closure for freshly forked workers.

pub mod fd_closure;
