// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Host-facing entry points: the settings hook and the lint hook.
//!
//! A [`MypyPlugin`] owns all state that lives for the editor session: the
//! mypy config file found per workspace, the last diagnostics per document,
//! and the shadow files used for live checks. Separate instances share
//! nothing.

use lsp_types::Diagnostic;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::Result;
use crate::cache::DiagnosticsCache;
use crate::checker::{Backend, CheckRequest, Shadow};
use crate::config::{
    self, DeprecationNotices, MYPY_CONFIG_NAMES, PLUGIN_NAMESPACE, PluginSettings,
};
use crate::document::Document;
use crate::parse::parse_report;
use crate::runner::{CommandRunner, SystemRunner};
use crate::shadow::ShadowFiles;

/// mypy integration for a language server host.
pub struct MypyPlugin<R = SystemRunner> {
    runner: R,
    /// Workspace root to the mypy config file found for it.
    config_files: RwLock<HashMap<PathBuf, Option<PathBuf>>>,
    cache: DiagnosticsCache,
    shadows: ShadowFiles,
    notices: DeprecationNotices,
}

impl Default for MypyPlugin<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl MypyPlugin<SystemRunner> {
    /// Creates a plugin that runs the real mypy executables.
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl<R: CommandRunner> MypyPlugin<R> {
    /// Creates a plugin that runs checkers through `runner`.
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            config_files: RwLock::default(),
            cache: DiagnosticsCache::new(),
            shadows: ShadowFiles::new(),
            notices: DeprecationNotices::default(),
        }
    }

    /// Places shadow files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_shadow_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shadows = ShadowFiles::in_dir(dir);
        self
    }

    /// The per-document diagnostics cache.
    pub const fn cache(&self) -> &DiagnosticsCache {
        &self.cache
    }

    /// The shadow files used for live checks.
    pub const fn shadows(&self) -> &ShadowFiles {
        &self.shadows
    }

    /// The mypy config file recorded for `workspace` by [`Self::settings`].
    pub async fn mypy_config_file(&self, workspace: &Path) -> Option<PathBuf> {
        self.config_files
            .read()
            .await
            .get(workspace)
            .cloned()
            .flatten()
    }

    /// Settings hook: reads the plugin settings for `workspace` and records
    /// its mypy config file.
    ///
    /// Returns `{"plugins": {"pylsp_mypy": {...}}}` for the host to merge
    /// into its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be parsed.
    pub async fn settings(&self, workspace: &Path) -> Result<Value> {
        info!("init workspace = {}", workspace.display());

        let configuration = config::load_plugin_settings(workspace)?;
        let mypy_config = config::find_config_file(workspace, &MYPY_CONFIG_NAMES);

        info!(
            "mypy config file = {:?} configuration = {}",
            mypy_config, configuration
        );

        self.config_files
            .write()
            .await
            .insert(workspace.to_path_buf(), mypy_config);

        Ok(json!({ "plugins": { (PLUGIN_NAMESPACE): configuration } }))
    }

    /// Lint hook: type-checks `document` and returns its diagnostics.
    ///
    /// `host` is the host configuration holding the plugin namespaces.
    /// An unsaved document is checked from a shadow copy in live mode. With
    /// live mode off, an unsaved document that was linted before gets its
    /// previous diagnostics back without running mypy.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are malformed, the shadow file
    /// cannot be written, or the checker cannot be started.
    pub async fn lint(
        &self,
        host: &Value,
        workspace: &Path,
        document: &Document,
        is_saved: bool,
    ) -> Result<Vec<Diagnostic>> {
        let settings = PluginSettings::resolve(host, &self.notices)?;
        let path = document.path();

        info!(
            "lint settings = {:?} document.path = {} is_saved = {}",
            settings,
            path.display(),
            is_saved
        );

        let mut live_mode = settings.live_mode;
        if settings.dmypy && live_mode {
            // dmypy only checks what is on disk.
            warn!("live_mode is not supported with dmypy, disabling");
            live_mode = false;
        }

        let shadow_path = if live_mode && !is_saved {
            let shadow = self.shadows.write(path, document.source()).await?;
            info!("live_mode shadow file = {}", shadow.display());
            Some(shadow)
        } else {
            // Documents are reported unsaved right after launch, so a miss
            // here falls through to checking the file on disk.
            if !is_saved && let Some(cached) = self.cache.cached(path).await {
                info!(
                    "non-live, returning cached diagnostics len(cached) = {}",
                    cached.len()
                );
                return Ok(cached);
            }
            None
        };

        let config_file = self.mypy_config_file(workspace).await;
        let request = CheckRequest {
            document: path,
            config_file: config_file.as_deref(),
            shadow: shadow_path.as_deref().map(|shadow| Shadow {
                source: path,
                shadow,
            }),
        };

        let output = Backend::from_settings(&settings)
            .check(&self.runner, &settings, &request)
            .await?;

        debug!("report:\n{}", output.stdout);
        debug!("errors:\n{}", output.stderr);
        if output.status.is_none_or(|code| code > 1) {
            warn!(
                "mypy exited with status {:?}: {}",
                output.status,
                output.stderr.trim()
            );
        }

        let diagnostics = parse_report(&output.stdout, Some(document));
        info!("mypy len(diagnostics) = {}", diagnostics.len());

        self.cache.put(path.to_path_buf(), diagnostics.clone()).await;
        Ok(diagnostics)
    }

    /// Removes all shadow files. Call once when the host shuts down.
    pub async fn shutdown(&self) {
        self.shadows.cleanup().await;
    }
}
