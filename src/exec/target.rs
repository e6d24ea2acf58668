// src/exec/target.rs

//! What to run: a program argv or a module run through an interpreter.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_INTERPRETER;
use crate::errors::{RekindleError, Result};

/// The supervised program. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    argv: Vec<String>,
    module: bool,
    interpreter: Option<String>,
}

impl TargetSpec {
    /// `argv[0]` is a program (or script when an interpreter is set), or a
    /// module name when `module` is true.
    pub fn new(argv: Vec<String>, module: bool, interpreter: Option<String>) -> Result<Self> {
        match argv.first() {
            None => {
                return Err(RekindleError::TargetError("no program given".to_string()));
            }
            Some(first) if first.trim().is_empty() => {
                return Err(RekindleError::TargetError("program name is empty".to_string()));
            }
            _ => {}
        }
        let interpreter = interpreter.filter(|i| !i.trim().is_empty());
        Ok(Self {
            argv,
            module,
            interpreter,
        })
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn is_module(&self) -> bool {
        self.module
    }

    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }

    /// Full command line, program first.
    ///
    /// - module mode: `<interpreter|python3> -m <module> args...`
    /// - with an interpreter: `<interpreter> argv...`
    /// - otherwise: `argv...`
    pub fn command_line(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(self.argv.len() + 2);
        if self.module {
            line.push(
                self.interpreter
                    .clone()
                    .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            );
            line.push("-m".to_string());
        } else if let Some(interpreter) = &self.interpreter {
            line.push(interpreter.clone());
        }
        line.extend(self.argv.iter().cloned());
        line
    }

    /// Executable that will actually be spawned.
    pub fn program(&self) -> String {
        // `command_line` is never empty: `argv` has at least one element.
        self.command_line().swap_remove(0)
    }

    /// Resolve the program before the control loop starts.
    ///
    /// A name containing a path separator must exist as a file; a bare name
    /// is looked up on `PATH`.
    pub fn validate(&self) -> Result<PathBuf> {
        let program = self.program();
        let as_path = Path::new(&program);

        if as_path.components().count() > 1 {
            if as_path.is_file() {
                return Ok(as_path.to_path_buf());
            }
            return Err(RekindleError::TargetError(format!(
                "program not found: {program}"
            )));
        }

        which::which(&program)
            .map_err(|e| RekindleError::TargetError(format!("cannot find '{program}': {e}")))
    }

    /// Shell-ish rendering for status lines.
    pub fn display(&self) -> String {
        self.command_line().join(" ")
    }
}
