// src/engine/mod.rs

//! Reload orchestration engine.
//!
//! This module ties together:
//! - the preload registry and reload policy
//! - debouncing (all pending events collapse into at most one reload)
//! - the main control loop that reacts to:
//!   - key presses
//!   - file and preload changes
//!   - child exits
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

pub mod core;
pub mod event_handlers;
pub mod plan;
pub mod runtime;

pub use core::{CoreRuntime, LoopState};
pub use event_handlers::{CoreCommand, CoreStep};
pub use plan::ReloadPlan;
pub use runtime::Runtime;
