// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Type checker invocation: argument building and backend selection.

use std::path::Path;
use tracing::info;

use crate::Result;
use crate::config::PluginSettings;
use crate::runner::{CommandRunner, ProcessOutput};

/// Where the checker reads an unsaved document from.
#[derive(Debug, Clone, Copy)]
pub struct Shadow<'a> {
    /// The document's real path, as mypy will report it.
    pub source: &'a Path,
    /// The temporary file holding the unsaved text.
    pub shadow: &'a Path,
}

/// Inputs for one checker run.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    /// The document to check.
    pub document: &'a Path,
    /// The workspace's mypy configuration file, if one was found.
    pub config_file: Option<&'a Path>,
    /// Shadow mapping for live checks of unsaved buffers.
    pub shadow: Option<Shadow<'a>>,
}

/// How mypy is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// A fresh `mypy` process per check, using the incremental cache.
    OneShot,
    /// The persistent `dmypy` daemon. Only checks saved files.
    Daemon,
}

impl Backend {
    /// Picks the backend from the `dmypy` setting.
    pub const fn from_settings(settings: &PluginSettings) -> Self {
        if settings.dmypy {
            Self::Daemon
        } else {
            Self::OneShot
        }
    }

    /// Builds the full argument list for a check, excluding the executable.
    pub fn args(self, settings: &PluginSettings, request: &CheckRequest<'_>) -> Vec<String> {
        let mut args = vec!["--show-column-numbers".to_string()];
        args.extend(settings.args.iter().cloned());

        if let Some(shadow) = request.shadow {
            args.push("--shadow-file".to_string());
            args.push(path_arg(shadow.source));
            args.push(path_arg(shadow.shadow));
        }

        if let Some(config_file) = request.config_file {
            args.push("--config-file".to_string());
            args.push(path_arg(config_file));
        }

        args.push(path_arg(request.document));

        if settings.strict {
            args.push("--strict".to_string());
        }

        match self {
            Self::OneShot => {
                args.extend(["--incremental", "--follow-imports", "silent"].map(String::from));
                args
            }
            Self::Daemon => {
                let mut run = vec!["run".to_string(), "--".to_string()];
                run.append(&mut args);
                run
            }
        }
    }

    /// Runs the checker and returns its captured output.
    ///
    /// The daemon is probed with `status` first. A non-zero status means it
    /// is dead or hung, so it is killed (a no-op when already dead) and
    /// `run` starts a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if an executable cannot be started.
    pub async fn check<R: CommandRunner>(
        self,
        runner: &R,
        settings: &PluginSettings,
        request: &CheckRequest<'_>,
    ) -> Result<ProcessOutput> {
        let args = self.args(settings, request);

        match self {
            Self::OneShot => {
                info!("executing mypy args = {:?}", args);
                runner.run(&settings.mypy_command, &args).await
            }
            Self::Daemon => {
                let dmypy = settings.dmypy_command.as_str();
                let status = runner.run(dmypy, &["status".to_string()]).await?;
                if !status.success() {
                    info!(
                        "restarting dmypy from status: {:?} message: {}",
                        status.status,
                        status.stderr.trim()
                    );
                    runner.run(dmypy, &["kill".to_string()]).await?;
                }

                info!("dmypy run args = {:?}", args);
                runner.run(dmypy, &args).await
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
