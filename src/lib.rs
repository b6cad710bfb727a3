// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! mypy-bridge runs the mypy static type checker on behalf of a language
//! server and turns its report into LSP diagnostics.
//!
//! Unsaved buffers are checked through shadow files, mypy can be driven as a
//! one-shot process or through its daemon, and the last result per document
//! is kept for when a fresh check is not possible.

/// Last-known diagnostics per document.
pub mod cache;
/// Checker argument building and one-shot/daemon backends.
pub mod checker;
/// Plugin settings and configuration file discovery.
pub mod config;
/// Documents as handed over by the host.
pub mod document;
/// Error type.
pub mod error;
/// Parsing of mypy report lines.
pub mod parse;
/// Settings and lint hooks.
pub mod plugin;
/// Subprocess execution.
pub mod runner;
/// Shadow files for unsaved buffers.
pub mod shadow;

pub use config::{PluginSettings, find_config_file};
pub use document::Document;
pub use error::{Error, Result};
pub use parse::parse_line;
pub use plugin::MypyPlugin;
