// src/exec/mod.rs

//! Batch compilation and execution.
//!
//! - [`scheduler`] compiles step descriptors into a dependency graph and
//!   owns the sequential and concurrent drivers.
//! - [`parallel`] is the dependency-driven concurrent executor: one task per
//!   vertex, fan-in joins on upstream completion signals.
//! - [`runner`] defines the injected task capability and the default shell
//!   implementation built on `tokio::process::Command`.

pub mod parallel;
pub mod runner;
pub mod scheduler;

pub use runner::{ShellRunner, TaskRunner};
pub use scheduler::{CompiledBatch, GraphExec, Step};
