//! Configuration for boltdesk
//!
//! This crate resolves how bolt is invoked (binary, project directory,
//! timeouts), how long query results are cached, and which ad-hoc commands
//! may be run.

pub mod config;
pub mod loader;
pub mod whitelist;

pub use config::*;
pub use loader::*;
pub use whitelist::*;
