// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! A scriptable stand-in for `mypy` and `dmypy`, for integration tests.
//!
//! Accepts the command lines mypy-bridge builds and reports findings from
//! marker comments in the checked file:
//!
//! ```text
//! x = undefined  # mock: error: Name "undefined" is not defined
//! ```
//!
//! becomes `<file>:<line>:<col>: error: Name "undefined" is not defined`,
//! where `<col>` is the first non-blank column. When `--shadow-file` maps the
//! target, markers are read from the shadow copy. Each run also reports a
//! note against `followed_import.py`, which the bridge is expected to drop.
//!
//! Environment:
//! - `MOCKMYPY_LOG`: append each invocation's arguments to this file.
//! - `MOCKMYPY_STATUS`: exit code for `status` (default 0).

#![allow(clippy::print_stdout, reason = "mock checker reports on stdout")]
#![allow(clippy::print_stderr, reason = "mock checker reports failures on stderr")]

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

const MARKER: &str = "# mock: ";

/// Mock mypy/dmypy for integration testing.
#[derive(Parser, Debug)]
#[command(name = "mockmypy")]
struct Args {
    /// Append each invocation's arguments to this file.
    #[arg(long, env = "MOCKMYPY_LOG", global = true)]
    log: Option<PathBuf>,

    /// dmypy subcommand; absent for a one-shot mypy run.
    #[command(subcommand)]
    command: Option<DaemonCommand>,

    #[command(flatten)]
    check: CheckArgs,
}

/// The dmypy subcommands mypy-bridge issues.
#[derive(Subcommand, Debug)]
enum DaemonCommand {
    /// Report daemon health through the exit code.
    Status {
        /// Exit code to report.
        #[arg(long, env = "MOCKMYPY_STATUS", default_value_t = 0)]
        exit_code: u8,
    },

    /// Stop the daemon.
    Kill,

    /// Check files through the daemon.
    Run {
        /// mypy flags and targets, after `--`.
        #[arg(last = true)]
        mypy_args: Vec<String>,
    },
}

/// The mypy flags mypy-bridge passes.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "mypy")]
struct CheckArgs {
    /// Report column numbers.
    #[arg(long)]
    show_column_numbers: bool,

    /// Read `SOURCE` from `SHADOW`.
    #[arg(long, num_args = 2, value_names = ["SOURCE", "SHADOW"])]
    shadow_file: Vec<PathBuf>,

    /// mypy configuration file.
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Strict mode.
    #[arg(long)]
    strict: bool,

    /// Incremental mode.
    #[arg(long)]
    incremental: bool,

    /// Import following policy.
    #[arg(long)]
    follow_imports: Option<String>,

    /// File to check.
    target: Option<PathBuf>,
}

impl CheckArgs {
    /// The file markers are read from: the shadow copy when it maps `target`.
    fn read_from<'a>(&'a self, target: &'a Path) -> &'a Path {
        match self.shadow_file.as_slice() {
            [source, shadow] if source == target => shadow.as_path(),
            _ => target,
        }
    }
}

/// Turns marker comments into report lines.
fn report(target: &str, source: &str) -> Vec<String> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let (_, finding) = line.split_once(MARKER)?;
            let col = line.len() - line.trim_start().len() + 1;
            Some(format!("{target}:{}:{col}: {}", idx + 1, finding.trim()))
        })
        .collect()
}

fn log_invocation(path: &Path) {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let written = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", args.join(" ")));
    if let Err(e) = written {
        eprintln!("mockmypy: cannot log to {}: {e}", path.display());
    }
}

fn check(args: &CheckArgs) -> ExitCode {
    let Some(target) = &args.target else {
        eprintln!("mockmypy: missing target file");
        return ExitCode::from(2);
    };
    if let Some(config) = &args.config_file {
        eprintln!("mockmypy: using config file {}", config.display());
    }

    let read_from = args.read_from(target);
    let source = match std::fs::read_to_string(read_from) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("mockmypy: cannot read {}: {e}", read_from.display());
            return ExitCode::from(2);
        }
    };

    let findings = report(&target.to_string_lossy(), &source);
    println!("followed_import.py:1: note: followed import");
    for finding in &findings {
        println!("{finding}");
    }

    if findings.is_empty() {
        println!("Success: no issues found in 1 source file");
        ExitCode::SUCCESS
    } else {
        println!(
            "Found {} errors in 1 file (checked 1 source file)",
            findings.len()
        );
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Some(log) = &args.log {
        log_invocation(log);
    }

    match args.command {
        Some(DaemonCommand::Status { exit_code }) => {
            if exit_code == 0 {
                println!("Daemon is up and running");
            } else {
                eprintln!("Daemon is stuck; consider dmypy kill");
            }
            ExitCode::from(exit_code)
        }
        Some(DaemonCommand::Kill) => {
            println!("Daemon killed");
            ExitCode::SUCCESS
        }
        Some(DaemonCommand::Run { mypy_args }) => {
            match CheckArgs::try_parse_from(std::iter::once("dmypy run".to_string()).chain(mypy_args)) {
                Ok(check_args) => check(&check_args),
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::from(2)
                }
            }
        }
        None => check(&args.check),
    }
}
