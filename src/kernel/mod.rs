//! Thin wrappers around Linux process primitives.
//!
//! `fork`, `_exit`, and the kill/reap path used by the supervisor live here.

pub mod process;
