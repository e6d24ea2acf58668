// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RekindleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The program (or module) to supervise cannot be found or started.
    #[error("Target error: {0}")]
    TargetError(String),

    /// The terminal could not be switched into keyboard mode.
    #[error("Terminal error: {0}")]
    TerminalError(String),

    /// A child could not be stopped, not even forcibly.
    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RekindleError>;
