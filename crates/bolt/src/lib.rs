//! Bolt execution for boltdesk
//!
//! This crate runs the bolt CLI as a subprocess and turns what it prints into
//! typed results:
//!
//! - [`runner`] spawns bolt, streams its output and enforces the deadline
//! - [`parser`] decodes stdout as JSON
//! - [`transform`] maps the decoded document onto `Node`, `Facts`, `Task` and
//!   `ExecutionResult`
//! - [`classifier`] turns a failed run's stderr into a typed error
//! - [`service`] composes the above with the caches into the operations
//!   callers use

pub mod args;
pub mod classifier;
pub mod parser;
pub mod runner;
pub mod service;
pub mod testing;
pub mod transform;

pub use classifier::{classify, FailureContext, Operation};
pub use parser::parse_output;
pub use runner::{ExecOptions, OutputSink, ProcessRunner, RawOutput, SystemProcessRunner};
pub use service::{BoltService, PackageRequest, PuppetRunOptions};
