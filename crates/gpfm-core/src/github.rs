//! GitHub release resolution.
//!
//! Resolves a configured repository reference to exactly one release and
//! one downloadable asset, using the read-only release endpoints of the
//! GitHub REST API. Releases are fetched fresh for every job; nothing is
//! cached across sources or runs.

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpError};
use crate::source::GitHubSource;

const API_BASE: &str = "https://api.github.com";
const RELEASES_PAGE_SIZE: usize = 30;

/// A published release of a GitHub repository.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    /// Human-readable release title; may be absent upstream.
    pub name: Option<String>,
    pub tag_name: String,
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl GitHubRelease {
    /// Display label: the release title when present, the tag otherwise.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.tag_name)
    }
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Split a repository URI into `(owner, repo)`.
///
/// The path portion must consist of exactly two non-empty segments;
/// anything else is rejected here, before any network access.
pub fn parse_repository(repository: &Url) -> Result<(String, String)> {
    let segments: Vec<&str> = repository.path().trim_matches('/').split('/').collect();

    match segments.as_slice() {
        [owner, repo] if !owner.trim().is_empty() && !repo.trim().is_empty() => {
            Ok(((*owner).to_string(), (*repo).to_string()))
        }
        _ => Err(Error::InvalidRepository {
            url: repository.to_string(),
        }),
    }
}

/// Select the release to use from a newest-first release list.
///
/// With `include_pre_release` the newest release wins regardless of its
/// pre-release flag; otherwise the newest release not marked pre-release.
pub fn select_release(
    releases: &[GitHubRelease],
    include_pre_release: bool,
) -> Option<&GitHubRelease> {
    if include_pre_release {
        releases.first()
    } else {
        releases.iter().find(|release| !release.prerelease)
    }
}

/// First asset whose file name matches `pattern`, in listed order.
///
/// The pattern is applied as a regular-expression search, not a full
/// match, so `"windows"` matches `app-windows.zip`.
pub fn select_asset<'a>(release: &'a GitHubRelease, pattern: &str) -> Result<&'a GitHubAsset> {
    let regex = Regex::new(pattern).map_err(|e| Error::InvalidAssetPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    release
        .assets
        .iter()
        .find(|asset| regex.is_match(&asset.name))
        .ok_or_else(|| Error::NoMatchingAsset {
            pattern: pattern.to_string(),
            release: release.tag_name.clone(),
        })
}

/// Client for the read-only release endpoints of the GitHub REST API.
pub struct GitHubClient {
    http: Arc<HttpClient>,
}

impl GitHubClient {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// The newest releases of a repository (first page, newest-first).
    pub async fn releases(&self, owner: &str, repo: &str) -> Result<Vec<GitHubRelease>> {
        let url =
            format!("{API_BASE}/repos/{owner}/{repo}/releases?per_page={RELEASES_PAGE_SIZE}");
        Ok(self.http.get_json(&url).await?)
    }

    /// The newest release not marked as pre-release, as reported upstream.
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<GitHubRelease> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/releases/latest");
        Ok(self.http.get_json(&url).await?)
    }

    /// The release carrying an exact tag.
    pub async fn release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<GitHubRelease> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/releases/tags/{tag}");

        match self.http.get_json(&url).await {
            Ok(release) => Ok(release),
            Err(HttpError::HttpStatus { status: 404, .. }) => Err(Error::ReleaseNotFound {
                repo: format!("{owner}/{repo}"),
                tag: tag.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the release selected by a source configuration.
    ///
    /// An explicit `tag` wins; otherwise the newest release is taken from
    /// the release list, restricted to non-pre-releases unless
    /// `include_pre_release` is set (see [`select_release`]).
    pub async fn resolve_release(&self, source: &GitHubSource) -> Result<GitHubRelease> {
        let (owner, repo) = parse_repository(&source.repository)?;

        if let Some(tag) = source.tag.as_deref().filter(|tag| !tag.is_empty()) {
            return self.release_by_tag(&owner, &repo, tag).await;
        }

        let releases = self.releases(&owner, &repo).await?;
        select_release(&releases, source.include_pre_release)
            .cloned()
            .ok_or_else(|| Error::NoReleases {
                repo: format!("{owner}/{repo}"),
            })
    }
}
