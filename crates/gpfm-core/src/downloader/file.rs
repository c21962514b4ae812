//! Staged downloads for remote sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::http::HttpClient;
use crate::staging::staged_file_name;

/// Downloads remote content into a staging directory.
pub struct FileDownloader {
    http: Arc<HttpClient>,
}

impl FileDownloader {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Stream `url` into `staging_dir/file_name` and return the staged
    /// path.
    ///
    /// The staging directory is created when absent, and a placeholder
    /// extension is appended when `file_name` carries none. A failed
    /// download may leave a partially written file; the staging area is
    /// discarded with the job either way.
    pub async fn download_to<F>(
        &self,
        url: &str,
        staging_dir: &Path,
        file_name: &str,
        progress: Option<F>,
    ) -> Result<PathBuf>
    where
        F: Fn(u64, u64),
    {
        std::fs::create_dir_all(staging_dir)?;

        let dest = staging_dir.join(staged_file_name(file_name));
        self.http.download(url, &dest, progress).await?;

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloader_creation() {
        let http = Arc::new(HttpClient::new().unwrap());
        let _downloader = FileDownloader::new(http);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_download_to_staging() {
        use tempfile::TempDir;

        let http = Arc::new(HttpClient::new().unwrap());
        let downloader = FileDownloader::new(http);
        let temp_dir = TempDir::new().unwrap();
        let staging_dir = temp_dir.path().join("source");

        let staged = downloader
            .download_to(
                "https://httpbin.org/bytes/100",
                &staging_dir,
                "payload",
                None::<fn(u64, u64)>,
            )
            .await
            .unwrap();

        // Placeholder extension appended for extension-less names.
        assert_eq!(staged.file_name().unwrap(), "payload.tmp");
        assert!(staged.is_file());
    }
}
