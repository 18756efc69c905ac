//! File content access.
//!
//! The bundler never touches the file system directly; it reads module text
//! through a [`FileAccess`] implementation supplied by the caller.

use std::collections::HashMap;
use std::future::Future;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::path;

/// Reads module text by absolute path.
pub trait FileAccess: Send + Sync {
    /// Returns the full text of the file at `path`.
    fn read(&self, path: &Utf8Path) -> impl Future<Output = io::Result<String>> + Send;
}

/// Reads files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFiles;

impl FileAccess for DiskFiles {
    fn read(&self, path: &Utf8Path) -> impl Future<Output = io::Result<String>> + Send {
        let path = path.to_path_buf();
        async move { tokio::fs::read_to_string(path).await }
    }
}

/// An in-memory file store.
///
/// Paths are compared after separator unification and `.`/`..` cleanup, so
/// `C:\p\a.js` and `C:/p/./a.js` name the same entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<Utf8PathBuf, String>,
}

impl MemoryFiles {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl AsRef<Utf8Path>, content: impl Into<String>) {
        self.files
            .insert(path::clean_path(path.as_ref()), content.into());
    }

    /// Builder-style [`MemoryFiles::insert`].
    pub fn with_file(mut self, path: impl AsRef<Utf8Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Returns the number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileAccess for MemoryFiles {
    fn read(&self, path: &Utf8Path) -> impl Future<Output = io::Result<String>> + Send {
        let result = self
            .files
            .get(&path::clean_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}"))
            });
        std::future::ready(result)
    }
}
