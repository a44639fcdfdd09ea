// src/system/executor.rs

//! Subprocess execution through the platform shell.

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Commandline could not be executed: {0}")]
    SpawnFailed(#[from] io::Error),
}

/// Runs a fully resolved commandline through the platform shell with all
/// stdio inherited, blocking until it finishes.
///
/// Returns the child's exit status code verbatim so callers can propagate
/// it as their own exit status. A child killed by a signal has no code and
/// is reported as 1.
pub fn run_in_shell(cmdline: &str) -> Result<i32, ExecutionError> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(cmdline);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmdline);
        command
    };
    let status = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    log::debug!("child exited with {status}");
    Ok(status.code().unwrap_or(1))
}
