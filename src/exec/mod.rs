// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`target`] describes what to run ([`TargetSpec`]).
//! - [`child`] models one lifetime of the program ([`ChildRun`]).
//! - [`runner`] spawns a child with `tokio::process::Command` and waits on
//!   it, stopping it on request.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the control loop uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod child;
pub mod runner;
pub mod target;

pub use backend::{ExecutorBackend, RealExecutorBackend, StartRequest};
pub use child::{ChildRun, RunId, RunState};
pub use runner::{build_command, exit_code, ENV_PRELOAD, ENV_RELOAD};
pub use target::TargetSpec;
