// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! mypy-bridge CLI.
//!
//! Drives the settings and lint hooks from the command line, printing JSON so
//! editors and scripts can consume the results.

#![allow(clippy::print_stdout, reason = "CLI tool needs to output to stdout")]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mypy_bridge::{Document, MypyPlugin};

/// Command-line arguments for mypy-bridge.
#[derive(Parser, Debug)]
#[command(name = "mypy-bridge")]
#[command(about = "Run mypy and report its findings as LSP diagnostics")]
#[command(version = env!("MYPY_BRIDGE_VERSION"))]
struct Args {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Workspace root directory (default: current directory).
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,
}

/// Subcommands supported by mypy-bridge.
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plugin settings found for the workspace.
    Settings,

    /// Type-check a file and print its diagnostics as a JSON array.
    Lint {
        /// The Python file to check.
        file: PathBuf,

        /// Treat the buffer as unsaved and read its current text from stdin.
        #[arg(long)]
        unsaved: bool,

        /// Plugin settings overriding the workspace settings, as a JSON
        /// mapping of namespace to settings,
        /// e.g. '{"pylsp_mypy": {"strict": true}}'.
        #[arg(long)]
        settings: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mypy_bridge=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match args.command {
        Command::Settings => run_settings(&root).await,
        Command::Lint {
            file,
            unsaved,
            settings,
        } => run_lint(&root, file, unsaved, settings.as_deref()).await,
    }
}

async fn run_settings(root: &Path) -> Result<()> {
    let plugin = MypyPlugin::new();
    let settings = plugin
        .settings(root)
        .await
        .context("Failed to read plugin settings")?;

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

async fn run_lint(root: &Path, file: PathBuf, unsaved: bool, overrides: Option<&str>) -> Result<()> {
    let plugin = MypyPlugin::new();

    let mut host = plugin
        .settings(root)
        .await
        .context("Failed to read plugin settings")?;

    if let Some(raw) = overrides {
        let overrides: Value =
            serde_json::from_str(raw).context("Failed to parse --settings as JSON")?;
        merge_plugin_settings(&mut host, &overrides)?;
    }
    debug!("host settings = {}", host);

    let document = if unsaved {
        let mut source = String::new();
        tokio::io::stdin()
            .read_to_string(&mut source)
            .await
            .context("Failed to read document text from stdin")?;
        Document::new(file, source)
    } else {
        Document::open(file)
            .await
            .context("Failed to read document")?
    };

    let result = plugin.lint(&host, root, &document, !unsaved).await;
    plugin.shutdown().await;
    let diagnostics = result.context("Failed to run type checker")?;

    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    Ok(())
}

/// Merges `{"namespace": {...}}` overrides into `host["plugins"]`, key by key.
fn merge_plugin_settings(host: &mut Value, overrides: &Value) -> Result<()> {
    let overrides = overrides
        .as_object()
        .ok_or_else(|| anyhow!("--settings must be a JSON object of plugin namespaces"))?;

    let plugins = host
        .as_object_mut()
        .and_then(|h| h.get_mut("plugins"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| anyhow!("host settings have no plugins mapping"))?;

    for (namespace, values) in overrides {
        let values = values
            .as_object()
            .ok_or_else(|| anyhow!("settings for '{namespace}' must be a JSON object"))?;

        let target = plugins
            .entry(namespace.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Some(target) = target.as_object_mut() {
            for (key, value) in values {
                target.insert(key.clone(), value.clone());
            }
        } else {
            *target = Value::Object(values.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_individual_keys() {
        let mut host = json!({"plugins": {"pylsp_mypy": {"strict": true, "live_mode": false}}});
        merge_plugin_settings(&mut host, &json!({"pylsp_mypy": {"live_mode": true}})).unwrap();

        assert_eq!(
            host,
            json!({"plugins": {"pylsp_mypy": {"strict": true, "live_mode": true}}})
        );
    }

    #[test]
    fn test_merge_adds_new_namespace() {
        let mut host = json!({"plugins": {"pylsp_mypy": {}}});
        merge_plugin_settings(&mut host, &json!({"mypy-ls": {"dmypy": true}})).unwrap();

        assert_eq!(host["plugins"]["mypy-ls"], json!({"dmypy": true}));
    }

    #[test]
    fn test_merge_rejects_non_objects() {
        let mut host = json!({"plugins": {"pylsp_mypy": {}}});
        assert!(merge_plugin_settings(&mut host, &json!(["strict"])).is_err());
        assert!(merge_plugin_settings(&mut host, &json!({"pylsp_mypy": true})).is_err());
    }
}
