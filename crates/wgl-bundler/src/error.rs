//! Bundler errors.

use std::io;

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use thiserror::Error;

/// A failure that aborts a compile.
///
/// Only file access can fail; parse problems degrade the output instead.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The file being compiled could not be read.
    #[error("failed to read `{path}`")]
    ReadEntry {
        /// The file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// An imported module could not be read.
    #[error("failed to read `{path}` imported from `{importer}`")]
    ReadImport {
        /// The resolved path of the imported module.
        path: Utf8PathBuf,
        /// Display path of the importing module.
        importer: SmolStr,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl BundleError {
    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            BundleError::ReadEntry { path, .. } | BundleError::ReadImport { path, .. } => path,
        }
    }
}
