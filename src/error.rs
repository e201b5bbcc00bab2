//! Error types shared by the manifest, inventory, installer and reconciler.

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, LvlupError>;

/// Errors produced while reconciling the manifest with the bin directory.
///
/// Some variants abort the whole invocation, others are reported for a single
/// tool and the batch carries on. See [`LvlupError::is_fatal`].
#[derive(Debug, thiserror::Error)]
pub enum LvlupError {
    /// The invoking user's home directory could not be resolved.
    #[error("could not determine the home directory")]
    HomeDirUnavailable,

    /// The manifest file does not exist.
    #[error("manifest not found at {}", path.display())]
    ManifestNotFound {
        /// Expected manifest location.
        path: PathBuf,
    },

    /// The manifest could not be read or written.
    #[error("manifest I/O failed at {}: {source}", path.display())]
    ConfigIo {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The manifest exists but is not valid YAML, or could not be serialized.
    #[error("manifest at {} is malformed: {source}", path.display())]
    ManifestFormat {
        /// Manifest path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The bin directory could not be read or created.
    #[error("bin directory I/O failed at {}: {source}", path.display())]
    DirectoryIo {
        /// Bin directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The external installer failed for one tool.
    #[error("failed to install {tool}: {reason}")]
    InstallFailure {
        /// Tool that failed.
        tool: String,
        /// Exit status or stderr of the installer.
        reason: String,
    },

    /// A binary could not be deleted for a reason other than being absent.
    #[error("failed to remove {}: {source}", path.display())]
    RemovalIo {
        /// Binary path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl LvlupError {
    /// Create a manifest I/O error with path context.
    pub fn config_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// Create a bin directory I/O error with path context.
    pub fn directory_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DirectoryIo {
            path: path.into(),
            source,
        }
    }

    /// Create an install failure for `tool`.
    pub fn install_failure(tool: &str, reason: impl Into<String>) -> Self {
        Self::InstallFailure {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the whole invocation.
    ///
    /// Install and removal failures only affect the tool they belong to.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InstallFailure { .. } | Self::RemovalIo { .. })
    }
}
