//! Per-job staging area for downloaded content.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use url::Url;

use crate::error::Result;

/// Appended to staged file names that carry no extension, so archive
/// handling downstream has a concrete file to open.
const PLACEHOLDER_EXTENSION: &str = "tmp";

/// Process-private scratch directory where downloads land before
/// extraction.
///
/// A fresh unique directory under the system temp area per job run, with
/// one subdirectory per source keyed by the source's display name. The
/// whole tree is removed when the area is dropped, on every job exit path.
#[derive(Debug)]
pub struct StagingArea {
    root: TempDir,
}

impl StagingArea {
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new().prefix("gpfm-").tempdir()?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// The staging subdirectory for a source, created on demand.
    pub fn dir_for(&self, source_name: &str) -> Result<PathBuf> {
        let dir = self.root.path().join(source_name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Staged file name for downloaded content: the given name, with the
/// placeholder extension appended when it has none.
pub fn staged_file_name(name: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.{PLACEHOLDER_EXTENSION}")
    }
}

/// The final non-empty path segment of a URL, used as the staged file name
/// for generic URL sources.
pub fn url_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| "download".to_string())
}
