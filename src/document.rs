// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

use lsp_types::Position;
use std::path::{Path, PathBuf};

/// A document handed over by the host for linting.
///
/// Holds the on-disk path and the current in-memory text, which may differ
/// from the file when the buffer is unsaved.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    source: String,
}

impl Document {
    /// Creates a document from its path and current text.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Reads the document text from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8.
    pub async fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| crate::Error::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, source })
    }

    /// The document's path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document's current text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the identifier surrounding `position`, or `""` if there is none.
    ///
    /// The word is the run of `[A-Za-z0-9_]` characters ending at the
    /// position joined with the run starting at it. `character` counts
    /// `char`s within the line and is clamped to the line length.
    pub fn word_at_position(&self, position: Position) -> &str {
        let Some(line) = self.source.split('\n').nth(position.line as usize) else {
            return "";
        };
        let line = line.strip_suffix('\r').unwrap_or(line);

        let split = line
            .char_indices()
            .nth(position.character as usize)
            .map_or(line.len(), |(idx, _)| idx);

        let start = line[..split]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map_or(split, |(idx, _)| idx);
        let end = line[split..]
            .char_indices()
            .find(|(_, c)| !is_word_char(*c))
            .map_or(line.len(), |(idx, _)| split + idx);

        &line[start..end]
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
