// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Temporary copies of unsaved buffers for live checking.
//!
//! mypy is pointed at these through `--shadow-file <real> <shadow>`, so the
//! real file on disk is never touched. Each document gets its own file, which
//! is created on first use and truncated and rewritten on every later use.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{Error, Result};

const SHADOW_PREFIX: &str = "mypy-bridge-";
const SHADOW_SUFFIX: &str = ".py";

/// Owns the shadow files for all documents checked in live mode.
///
/// Files are removed by [`ShadowFiles::cleanup`], or when the manager is
/// dropped.
#[derive(Debug, Default)]
pub struct ShadowFiles {
    /// Directory to create files in; the system temp directory when `None`.
    dir: Option<PathBuf>,
    files: Mutex<HashMap<PathBuf, NamedTempFile>>,
}

impl ShadowFiles {
    /// Creates a manager that places files in the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager that places files in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            files: Mutex::default(),
        }
    }

    /// Writes `content` to the shadow file for `document` and returns the
    /// shadow file's path.
    ///
    /// The path is stable for a given document across calls. The file is
    /// fully written and closed before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub async fn write(&self, document: &Path, content: &str) -> Result<PathBuf> {
        let mut files = self.files.lock().await;

        let path = match files.entry(document.to_path_buf()) {
            Entry::Occupied(entry) => entry.get().path().to_path_buf(),
            Entry::Vacant(entry) => {
                let file = self.create()?;
                debug!(
                    "shadow file for {} = {}",
                    document.display(),
                    file.path().display()
                );
                entry.insert(file).path().to_path_buf()
            }
        };

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Returns the shadow file path for `document`, if one exists.
    pub async fn path_for(&self, document: &Path) -> Option<PathBuf> {
        self.files
            .lock()
            .await
            .get(document)
            .map(|f| f.path().to_path_buf())
    }

    /// Deletes every shadow file. Files already removed by someone else are
    /// skipped silently.
    pub async fn cleanup(&self) {
        let drained: Vec<NamedTempFile> = self.files.lock().await.drain().map(|(_, f)| f).collect();

        for file in drained {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => debug!("removed shadow file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to remove shadow file {}: {}", path.display(), e),
            }
        }
    }

    fn create(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SHADOW_PREFIX).suffix(SHADOW_SUFFIX);

        let dir = self.dir.clone().unwrap_or_else(std::env::temp_dir);
        builder.tempfile_in(&dir).map_err(|source| Error::Io { path: dir, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_write_creates_file_with_content() {
        let dir = TempDir::new().unwrap();
        let shadows = ShadowFiles::in_dir(dir.path());

        let path = shadows
            .write(Path::new("/proj/a.py"), "x: int = 'no'\n")
            .await
            .unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "x: int = 'no'\n");
    }

    #[tokio::test]
    async fn test_rewrite_reuses_single_file() {
        let dir = TempDir::new().unwrap();
        let shadows = ShadowFiles::in_dir(dir.path());
        let doc = Path::new("/proj/a.py");

        let first = shadows.write(doc, "a much longer first version\n").await.unwrap();
        let second = shadows.write(doc, "short\n").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(entries(dir.path()), vec![second.clone()]);
        assert_eq!(fs::read_to_string(&second).unwrap(), "short\n");
    }

    #[tokio::test]
    async fn test_documents_get_separate_files() {
        let dir = TempDir::new().unwrap();
        let shadows = ShadowFiles::in_dir(dir.path());

        let a = shadows.write(Path::new("/proj/a.py"), "a\n").await.unwrap();
        let b = shadows.write(Path::new("/proj/b.py"), "b\n").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read_to_string(&a).unwrap(), "a\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "b\n");
        assert_eq!(shadows.path_for(Path::new("/proj/a.py")).await, Some(a));
    }

    #[tokio::test]
    async fn test_cleanup_removes_files() {
        let dir = TempDir::new().unwrap();
        let shadows = ShadowFiles::in_dir(dir.path());
        shadows.write(Path::new("/proj/a.py"), "a\n").await.unwrap();
        shadows.write(Path::new("/proj/b.py"), "b\n").await.unwrap();

        shadows.cleanup().await;

        assert!(entries(dir.path()).is_empty());
        assert!(shadows.path_for(Path::new("/proj/a.py")).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let shadows = ShadowFiles::in_dir(dir.path());
        let path = shadows.write(Path::new("/proj/a.py"), "a\n").await.unwrap();
        fs::remove_file(&path).unwrap();

        shadows.cleanup().await;
        // A second cleanup has nothing left to do.
        shadows.cleanup().await;

        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_drop_removes_files() {
        let dir = TempDir::new().unwrap();
        let path = {
            let shadows = ShadowFiles::in_dir(dir.path());
            shadows.write(Path::new("/proj/a.py"), "a\n").await.unwrap()
        };

        assert!(!path.exists());
    }
}
