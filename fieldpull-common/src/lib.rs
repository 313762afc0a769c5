//! Shared utilities for the fieldpull workspace.
//!
//! Currently this only hosts the [`observability`] module, which centralises
//! `tracing` initialisation so every binary and integration test logs through
//! the same sink. It is intentionally lightweight so all crates can depend on
//! it without pulling in heavy transitive costs.

pub mod observability;
