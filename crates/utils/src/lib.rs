//! Shared utilities for boltdesk
//!
//! Currently the tracing setup shared by the CLI and the helpers the bolt
//! service uses to emit spans and structured events.

pub mod tracing;

pub use self::tracing::*;
