//! Core domain types, errors, and constants for boltdesk.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias. Every failure a bolt
//!   invocation can produce maps onto one variant, and variants born from a
//!   subprocess keep its stdout, stderr and exit code.
//! - **`types`**: `Node`, `Facts`, `Task` and `ExecutionResult`, the values
//!   handed to callers.
//! - **`constants`**: environment variable names and defaults.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, FailureOutput, Result},
    types::*,
};
