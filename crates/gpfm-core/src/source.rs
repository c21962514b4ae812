//! Typed source descriptors and job configuration.
//!
//! Sources are described in JSON with a `type` discriminator field
//! (`gitHub`, `url`, `file`, `folder`). The discriminator name, the tag
//! strings and the field names are a stable contract relied upon by
//! external tooling; changing them breaks existing configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// A GitHub release asset source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubSource {
    pub name: String,
    #[serde(default)]
    pub skip: bool,
    /// Repository URI, e.g. `https://github.com/owner/repo`.
    pub repository: Url,
    /// Consider pre-releases when no explicit tag is configured.
    #[serde(default, rename = "includePreRelease")]
    pub include_pre_release: bool,
    /// Exact release tag; the newest release is used when unset.
    #[serde(default)]
    pub tag: Option<String>,
    /// Regular expression matched against asset file names.
    pub asset: String,
}

/// A zip archive downloaded from an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlSource {
    pub name: String,
    #[serde(default)]
    pub skip: bool,
    pub url: Url,
}

/// A single local file copied verbatim into the output root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSource {
    pub name: String,
    #[serde(default)]
    pub skip: bool,
    pub file: PathBuf,
}

/// A local directory tree merged verbatim into the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSource {
    pub name: String,
    #[serde(default)]
    pub skip: bool,
    pub folder: PathBuf,
}

/// One configured origin of content to merge into the output.
///
/// The enum is closed: the job runner dispatches on it exhaustively, so an
/// unexpected source type cannot reach the runner. Unknown discriminator
/// tags are rejected when the configuration is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Source {
    #[serde(rename = "gitHub")]
    GitHub(GitHubSource),
    #[serde(rename = "url")]
    Url(UrlSource),
    #[serde(rename = "file")]
    File(FileSource),
    #[serde(rename = "folder")]
    Folder(FolderSource),
}

impl Source {
    /// Display and staging label for the source. Need not be unique.
    pub fn name(&self) -> &str {
        match self {
            Source::GitHub(source) => &source.name,
            Source::Url(source) => &source.name,
            Source::File(source) => &source.name,
            Source::Folder(source) => &source.name,
        }
    }

    /// Whether the runner passes over this source.
    pub fn skip(&self) -> bool {
        match self {
            Source::GitHub(source) => source.skip,
            Source::Url(source) => source.skip,
            Source::File(source) => source.skip,
            Source::Folder(source) => source.skip,
        }
    }

    /// The discriminator tag used in configuration files.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::GitHub(_) => "gitHub",
            Source::Url(_) => "url",
            Source::File(_) => "file",
            Source::Folder(_) => "folder",
        }
    }
}

/// An ordered merge job.
///
/// Sources are applied in declared order; later sources overwrite earlier
/// ones on path collision. The output directory is fully owned by the job:
/// it is deleted and recreated at the start of every run, so it must never
/// alias a source path or hold data the caller wants to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "input")]
    pub sources: Vec<Source>,
    pub output: PathBuf,
}

impl JobConfig {
    /// Parse a job configuration from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a job configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
