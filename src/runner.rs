// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Subprocess execution for the type checker.

use std::future::Future;
use std::process::Stdio;
use tracing::debug;

use crate::{Error, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output, decoded as UTF-8 (lossy).
    pub stdout: String,
    /// Standard error, decoded as UTF-8 (lossy).
    pub stderr: String,
    /// Exit code, or `None` if the process was killed by a signal.
    pub status: Option<i32>,
}

impl ProcessOutput {
    /// Whether the process exited with status 0.
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Runs an executable to completion and captures its output.
///
/// The production implementation is [`SystemRunner`]; tests substitute a
/// recording double so no real type checker is needed.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, waiting for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started. A non-zero
    /// exit is not an error.
    fn run(&self, program: &str, args: &[String]) -> impl Future<Output = Result<ProcessOutput>> + Send;
}

/// Spawns real processes through `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        debug!("Executing: {} {:?}", program, args);

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}
