// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Error type shared by the library modules.

use std::path::PathBuf;

/// Errors raised while resolving settings or invoking the type checker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The checker executable could not be started (missing binary,
    /// permission denied, ...).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The executable that was invoked.
        program: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation on a shadow file or settings file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A settings file could not be parsed.
    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// A settings mapping did not have the expected shape.
    #[error("invalid plugin settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
