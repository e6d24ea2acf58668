use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// How much of the terminal to wipe before a child is (re)started.
///
/// Ordered by strength so that several requests can be merged with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClearMode {
    #[default]
    None,
    /// Erase the visible screen and home the cursor.
    Screen,
    /// Like `Screen`, and also drop the scrollback buffer.
    Scrollback,
}

impl ClearMode {
    /// Map the repeat count of `-c` to a mode: once = screen, twice or more =
    /// screen + scrollback.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => ClearMode::None,
            1 => ClearMode::Screen,
            _ => ClearMode::Scrollback,
        }
    }
}

/// Kind of restart requested by the control loop.
///
/// `Full` is stronger than `Partial`: merging both yields `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReloadKind {
    /// Restart only the target program; the preload registry stays warm.
    Partial,
    /// Evict and reload every preloaded module, then restart the target.
    Full,
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadKind::Partial => f.write_str("partial"),
            ReloadKind::Full => f.write_str("full"),
        }
    }
}

/// Signal used to ask a child to stop before escalating to a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StopSignal {
    #[default]
    #[value(alias = "sigint")]
    Int,
    #[value(alias = "sigterm")]
    Term,
}

/// Whether keyboard control is attempted at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardMode {
    /// Use the keyboard when stdin is a terminal, otherwise fall back to
    /// file-watch-only reloads with a warning.
    #[default]
    Auto,
    /// Fail at startup if the terminal cannot be put into keyboard mode.
    Required,
    /// Never read the keyboard.
    Off,
}
