//! Running host tools.
//!
//! Port and account sources on Windows read the output of host commands.
//! They go through [`CommandRunner`] so tests can feed recorded output
//! without spawning anything.

use std::process::{Command, Stdio};

use tracing::debug;

use hostledger_contracts::error::{LedgerError, LedgerResult};

/// Runs a program to completion and returns its standard output.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`.
    ///
    /// Fails with `LedgerError::Collection` when the program cannot be
    /// started or exits with a non-zero status.
    fn run(&self, program: &str, args: &[&str]) -> LedgerResult<String>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> LedgerResult<String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| LedgerError::collection(program, format!("failed to start: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LedgerError::collection(
                program,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        debug!(program, bytes = output.stdout.len(), "host command completed");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
