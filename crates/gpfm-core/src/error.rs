use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Failed to parse job configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid GitHub repository '{url}': expected exactly 'owner/repo'")]
    InvalidRepository { url: String },

    #[error("Invalid asset pattern '{pattern}': {reason}")]
    InvalidAssetPattern { pattern: String, reason: String },

    // Resolution errors
    #[error("Release not found: {repo} has no release tagged '{tag}'")]
    ReleaseNotFound { repo: String, tag: String },

    #[error("No matching release found for {repo}")]
    NoReleases { repo: String },

    #[error("No asset found matching pattern '{pattern}' in release '{release}'")]
    NoMatchingAsset { pattern: String, release: String },

    // Transport errors
    #[error("Download failed: {0}")]
    Http(#[from] HttpError),

    // Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File does not exist: '{}'", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Folder does not exist: '{}'", .path.display())]
    FolderNotFound { path: PathBuf },

    #[error("Failed to extract archive '{}': {reason}", .archive.display())]
    Extract { archive: PathBuf, reason: String },

    // Control flow
    #[error("Job was canceled")]
    Canceled,

    /// Wrapper added by the job runner so a fatal error reports the
    /// originating source's position and display name.
    #[error("Source [{index}] '{name}' failed: {source}")]
    Source {
        index: usize,
        name: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error is caused by the configuration itself rather than
    /// the environment the job ran in.
    pub fn is_config_error(&self) -> bool {
        match self {
            Error::ConfigParse(_)
            | Error::InvalidRepository { .. }
            | Error::InvalidAssetPattern { .. } => true,
            Error::Source { source, .. } => source.is_config_error(),
            _ => false,
        }
    }

    /// Whether the error is a cooperative cancellation outcome.
    pub fn is_canceled(&self) -> bool {
        match self {
            Error::Canceled => true,
            Error::Source { source, .. } => source.is_canceled(),
            _ => false,
        }
    }
}
