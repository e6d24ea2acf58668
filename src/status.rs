// src/status.rs

//! User-facing status lines.
//!
//! These are not diagnostics (those go through `tracing`); they are the short
//! `rekindle: ...` lines interleaved with the child's own output on stderr.

use std::io::{Write, stderr};

use owo_colors::{OwoColorize, Stream};

/// Print a `rekindle:`-prefixed status line to stderr.
///
/// ```ignore
/// status!("program exited with code {}", code);
/// ```
#[macro_export]
macro_rules! status {
    ($($arg:tt)*) => {{
        $crate::status::emit(&format!($($arg)*))
    }};
}

/// Write one status line. Failures to write to stderr are ignored.
pub fn emit(message: &str) {
    let prefix = "rekindle:";
    let prefix = prefix.if_supports_color(Stream::Stderr, |p| p.bright_yellow().bold().to_string());

    let mut err = stderr().lock();
    writeln!(err, "{prefix} {message}").ok();
    err.flush().ok();
}

/// Continuation lines under a status line (e.g. a list of files).
pub fn emit_detail(line: &str) {
    let mut err = stderr().lock();
    writeln!(err, "          {line}").ok();
    err.flush().ok();
}
