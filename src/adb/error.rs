use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for ADB and mirror operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for everything this tool does around `adb`.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error(
        "'adb' binary not found (looked in {sdk_dir:?} and PATH). Install Android Platform Tools or run with --refresh to download them."
    )]
    AdbNotFound { sdk_dir: PathBuf },

    #[error("Failed to invoke 'adb': {source}")]
    SpawnFailed { source: std::io::Error },

    #[error("adb command '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No platform-tools package is published for platform '{platform}'")]
    UnsupportedPlatform { platform: String },

    #[error("Download of {url} failed with HTTP {status}: {body}")]
    DownloadFailed {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Failed to read platform-tools archive: {source}")]
    Archive {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("Archive entry '{name}' escapes the extraction directory")]
    UnsafeArchiveEntry { name: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Filesystem watcher error: {source}")]
    Watch {
        #[from]
        source: notify::Error,
    },

    #[error("Task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl AdbError {
    /// Wrap an `io::Error` together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdbError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the remote side refused access (typical for `ls` on a non-rooted device).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            AdbError::CommandFailed { stderr, .. } => {
                stderr.contains("Permission denied") || stderr.contains("permission denied")
            }
            _ => false,
        }
    }
}
