//! Domain types produced from bolt output.
//!
//! All values here are built fresh per call and owned by the caller.
//!
//! - **`node`**: inventory targets and their transport configuration
//! - **`facts`**: descriptive data gathered from a target
//! - **`tasks`**: the task catalog and parameter metadata
//! - **`execution`**: results of command, task, puppet and package runs

pub mod execution;
pub mod facts;
pub mod node;
pub mod tasks;

// Re-export all public types for convenient access
pub use execution::*;
pub use facts::*;
pub use node::*;
pub use tasks::*;
