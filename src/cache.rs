// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Last-known diagnostics per document.
//!
//! Returning an empty list clears a document's diagnostics in the editor, so
//! when a document cannot be re-checked (unsaved buffer, live mode off) the
//! previous result is handed back instead. Entries are overwritten on every
//! completed lint and never evicted.

use lsp_types::Diagnostic;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Maps document paths to their most recent diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticsCache {
    entries: RwLock<HashMap<PathBuf, Vec<Diagnostic>>>,
}

impl DiagnosticsCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached diagnostics for `path`, or an empty list if the
    /// document was never linted.
    pub async fn get(&self, path: &Path) -> Vec<Diagnostic> {
        self.cached(path).await.unwrap_or_default()
    }

    /// Returns the cached diagnostics for `path` if an entry exists.
    ///
    /// An entry holding an empty list is still an entry.
    pub async fn cached(&self, path: &Path) -> Option<Vec<Diagnostic>> {
        self.entries.read().await.get(path).cloned()
    }

    /// Stores the diagnostics for `path`, replacing any previous entry.
    pub async fn put(&self, path: PathBuf, diagnostics: Vec<Diagnostic>) {
        self.entries.write().await.insert(path, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{DiagnosticSeverity, Position, Range};

    fn diag(message: &str) -> Diagnostic {
        Diagnostic {
            range: Range::new(Position::new(0, 0), Position::new(0, 1)),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some("mypy".to_string()),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unseen_path_is_empty() {
        let cache = DiagnosticsCache::new();
        assert!(cache.get(Path::new("/proj/a.py")).await.is_empty());
        assert!(cache.cached(Path::new("/proj/a.py")).await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = DiagnosticsCache::new();
        let path = PathBuf::from("/proj/a.py");
        cache.put(path.clone(), vec![diag("first")]).await;

        let got = cache.get(&path).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].message, "first");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = DiagnosticsCache::new();
        let path = PathBuf::from("/proj/a.py");
        cache.put(path.clone(), vec![diag("old"), diag("older")]).await;
        cache.put(path.clone(), vec![diag("new")]).await;

        let got = cache.get(&path).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].message, "new");
    }

    #[tokio::test]
    async fn test_empty_result_is_still_cached() {
        let cache = DiagnosticsCache::new();
        let path = PathBuf::from("/proj/clean.py");
        cache.put(path.clone(), Vec::new()).await;

        assert_eq!(cache.cached(&path).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_entries_are_per_path() {
        let cache = DiagnosticsCache::new();
        cache.put(PathBuf::from("/proj/a.py"), vec![diag("a")]).await;

        assert!(cache.get(Path::new("/proj/b.py")).await.is_empty());
    }
}
