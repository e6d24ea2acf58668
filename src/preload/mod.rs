// src/preload/mod.rs

//! Preloaded modules.
//!
//! The supervised program always runs as a separate process, so module state
//! cannot be shared with it in memory. Instead the supervisor keeps an
//! explicit registry of `(name, backing files, dirty flag)` records:
//!
//! - *loading* a module resolves its backing files against the search paths
//!   (see [`resolve`]) and keeps them tracked;
//! - a partial reload reuses the registry as is (warm);
//! - a full reload evicts every entry and loads them again, in order.
//!
//! Children receive the ordered list of loaded modules in
//! `REKINDLE_PRELOAD`, so a host that can warm them (e.g. an import hook)
//! knows what to import before the target starts.

pub mod registry;
pub mod resolve;

pub use registry::{
    ChangeSplit, LoadState, PreloadEntry, PreloadFailure, PreloadIndex, PreloadRegistry,
};
pub use resolve::resolve_module;
