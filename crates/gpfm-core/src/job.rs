//! Job orchestration: validate, reset the output, process sources in
//! order.
//!
//! Sources are processed strictly sequentially. The effects of source `i`
//! are fully written before source `i + 1` begins, which is what makes the
//! "later source wins on path collision" rule deterministic. The first
//! fatal error aborts the remaining sources; output already written by
//! completed sources stays in place.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use indicatif::ProgressBar;

use crate::cancel::CancelToken;
use crate::downloader::{ArchiveExtractor, FileDownloader};
use crate::error::{Error, Result};
use crate::github::{select_asset, GitHubClient};
use crate::http::HttpClient;
use crate::merge::{copy_directory, copy_file_into};
use crate::progress::ProgressManager;
use crate::source::{FileSource, FolderSource, GitHubSource, JobConfig, Source, UrlSource};
use crate::staging::{url_file_name, StagingArea};

/// Executes a merge job against its output directory.
pub struct Job {
    config: JobConfig,
    github: GitHubClient,
    downloader: FileDownloader,
    progress: ProgressManager,
    staging: Option<StagingArea>,
}

impl Job {
    pub fn new(config: JobConfig) -> Result<Self> {
        let http = Arc::new(HttpClient::new()?);

        Ok(Self {
            config,
            github: GitHubClient::new(http.clone()),
            downloader: FileDownloader::new(http),
            progress: ProgressManager::new(true),
            staging: None,
        })
    }

    /// Enable or disable download progress bars.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = ProgressManager::new(enabled);
        self
    }

    /// Run `config` to completion, polling `cancel` between steps.
    pub async fn run_config(config: JobConfig, cancel: &CancelToken) -> Result<()> {
        Job::new(config)?.run(cancel).await
    }

    /// Execute the job.
    pub async fn run(&mut self, cancel: &CancelToken) -> Result<()> {
        let result = self.run_inner(cancel).await;

        // Dropping the staging area deletes it, on success and failure
        // alike.
        self.staging = None;

        result
    }

    async fn run_inner(&mut self, cancel: &CancelToken) -> Result<()> {
        self.validate()?;
        self.reset_output()?;

        let sources = self.config.sources.clone();
        for (index, source) in sources.iter().enumerate() {
            cancel.check()?;

            println!(
                "{} Processing source '{}' ({})",
                style(format!("[{:02}]", index + 1)).bold(),
                source.name(),
                source.kind()
            );

            if source.skip() {
                println!("Skipping ...");
                continue;
            }

            self.process(source, cancel)
                .await
                .map_err(|e| wrap_source_error(e, index, source.name()))?;
        }

        Ok(())
    }

    /// Cheap structural checks, performed before anything destructive
    /// happens.
    ///
    /// GitHub and URL sources are validated while processing instead, since
    /// their validation requires network access.
    fn validate(&self) -> Result<()> {
        for (index, source) in self.config.sources.iter().enumerate() {
            if source.skip() {
                continue;
            }

            let check = match source {
                Source::File(file) if !file.file.is_file() => Err(Error::FileNotFound {
                    path: file.file.clone(),
                }),
                Source::Folder(folder) if !folder.folder.is_dir() => Err(Error::FolderNotFound {
                    path: folder.folder.clone(),
                }),
                _ => Ok(()),
            };

            check.map_err(|e| wrap_source_error(e, index, source.name()))?;
        }

        Ok(())
    }

    /// Delete and recreate the output directory. Destructive and
    /// irreversible; the one step of the pipeline with no opt-out.
    fn reset_output(&self) -> Result<()> {
        let output = &self.config.output;

        if output.exists() {
            fs::remove_dir_all(output)?;
        }
        fs::create_dir_all(output)?;

        Ok(())
    }

    async fn process(&mut self, source: &Source, cancel: &CancelToken) -> Result<()> {
        match source {
            Source::GitHub(github) => self.process_github(github).await,
            Source::Url(url) => self.process_url(url).await,
            Source::File(file) => self.process_file(file),
            Source::Folder(folder) => self.process_folder(folder, cancel),
        }
    }

    async fn process_github(&mut self, source: &GitHubSource) -> Result<()> {
        let release = self.github.resolve_release(source).await?;
        println!(
            "Using release: {} ({})",
            release.display_name(),
            release.tag_name
        );

        let asset = select_asset(&release, &source.asset)?;
        log::debug!("Selected asset '{}' from {} candidates", asset.name, release.assets.len());

        let staging_dir = self.staging_dir(&source.name)?;

        println!("Downloading asset '{}' ...", asset.name);
        let staged = {
            let bar = self.progress.download_bar(&asset.name, 0);
            let staged = self
                .downloader
                .download_to(
                    &asset.browser_download_url,
                    &staging_dir,
                    &asset.name,
                    Some(progress_callback(&bar)),
                )
                .await?;
            bar.finish_and_clear();
            staged
        };

        println!("Extracting ...");
        ArchiveExtractor::extract(&staged, &self.config.output)
    }

    async fn process_url(&mut self, source: &UrlSource) -> Result<()> {
        let staging_dir = self.staging_dir(&source.name)?;
        let file_name = url_file_name(&source.url);

        println!("Downloading {} ...", source.url);
        let staged = {
            let bar = self.progress.download_bar(&file_name, 0);
            let staged = self
                .downloader
                .download_to(
                    source.url.as_str(),
                    &staging_dir,
                    &file_name,
                    Some(progress_callback(&bar)),
                )
                .await?;
            bar.finish_and_clear();
            staged
        };

        println!("Extracting ...");
        ArchiveExtractor::extract(&staged, &self.config.output)
    }

    fn process_file(&self, source: &FileSource) -> Result<()> {
        println!("Copying file ...");
        copy_file_into(&source.file, &self.config.output)?;
        Ok(())
    }

    fn process_folder(&self, source: &FolderSource, cancel: &CancelToken) -> Result<()> {
        println!("Copying folder ...");
        copy_directory(&source.folder, &self.config.output, true, cancel)
    }

    /// The staging subdirectory for a source, creating the staging area
    /// lazily on first use.
    fn staging_dir(&mut self, source_name: &str) -> Result<PathBuf> {
        if self.staging.is_none() {
            self.staging = Some(StagingArea::new()?);
        }
        let staging = self
            .staging
            .as_ref()
            .expect("staging area initialized above");

        staging.dir_for(source_name)
    }
}

/// Attach the originating source's position and display name to a fatal
/// error. Cancellation passes through untouched.
fn wrap_source_error(error: Error, index: usize, name: &str) -> Error {
    match error {
        Error::Canceled => Error::Canceled,
        error => Error::Source {
            index,
            name: name.to_string(),
            source: Box::new(error),
        },
    }
}

fn progress_callback(bar: &ProgressBar) -> impl Fn(u64, u64) + '_ {
    move |downloaded, total| {
        if total > 0 {
            bar.set_length(total);
        }
        bar.set_position(downloaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn folder_source(name: &str, folder: PathBuf) -> Source {
        Source::Folder(FolderSource {
            name: name.to_string(),
            skip: false,
            folder,
        })
    }

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_config_yields_empty_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out");

        let config = JobConfig {
            sources: Vec::new(),
            output: output.clone(),
        };
        Job::run_config(config, &CancelToken::new()).await.unwrap();

        assert!(output.is_dir());
        assert!(dir_entries(&output).is_empty());
    }

    #[tokio::test]
    async fn test_all_skipped_sources_reset_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out");
        write(&output.join("stale.txt"), "stale");

        let config = JobConfig {
            sources: vec![Source::File(FileSource {
                name: "skipped".to_string(),
                skip: true,
                // Never touched: skipped sources are not even validated.
                file: PathBuf::from("/does/not/exist"),
            })],
            output: output.clone(),
        };
        Job::run_config(config, &CancelToken::new()).await.unwrap();

        assert!(output.is_dir());
        assert!(dir_entries(&output).is_empty());
    }

    #[tokio::test]
    async fn test_later_folder_source_wins_collisions() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let output = temp.path().join("out");

        write(&first.join("a.txt"), "from first");
        write(&first.join("only-first.txt"), "first");
        write(&second.join("a.txt"), "from second");

        let config = JobConfig {
            sources: vec![
                folder_source("first", first),
                folder_source("second", second),
            ],
            output: output.clone(),
        };
        Job::run_config(config, &CancelToken::new()).await.unwrap();

        assert_eq!(
            fs::read_to_string(output.join("a.txt")).unwrap(),
            "from second"
        );
        assert_eq!(
            fs::read_to_string(output.join("only-first.txt")).unwrap(),
            "first"
        );
    }

    #[tokio::test]
    async fn test_local_sources_are_idempotent() {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("src");
        let output = temp.path().join("out");

        write(&source_dir.join("a.txt"), "alpha");
        write(&source_dir.join("sub/b.txt"), "beta");
        let file = temp.path().join("extra.txt");
        write(&file, "extra");

        let config = JobConfig {
            sources: vec![
                folder_source("tree", source_dir),
                Source::File(FileSource {
                    name: "extra".to_string(),
                    skip: false,
                    file,
                }),
            ],
            output: output.clone(),
        };

        Job::run_config(config.clone(), &CancelToken::new())
            .await
            .unwrap();
        let first_run: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(&output)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect();

        Job::run_config(config, &CancelToken::new()).await.unwrap();
        let second_run: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(&output)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect();

        assert_eq!(first_run, second_run);
        assert_eq!(first_run.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_source_fails_before_output_reset() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out");
        write(&output.join("previous.txt"), "from previous run");

        let config = JobConfig {
            sources: vec![Source::File(FileSource {
                name: "broken".to_string(),
                skip: false,
                file: temp.path().join("missing.txt"),
            })],
            output: output.clone(),
        };

        let err = Job::run_config(config, &CancelToken::new())
            .await
            .unwrap_err();

        match err {
            Error::Source { index, name, source } => {
                assert_eq!(index, 0);
                assert_eq!(name, "broken");
                assert!(matches!(*source, Error::FileNotFound { .. }));
            }
            other => panic!("expected wrapped FileNotFound, got {other:?}"),
        }

        // Validation failed before the destructive reset, so the prior
        // output is untouched.
        assert_eq!(
            fs::read_to_string(output.join("previous.txt")).unwrap(),
            "from previous run"
        );
    }

    #[tokio::test]
    async fn test_canceled_job_stops_before_first_source() {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("src");
        let output = temp.path().join("out");
        write(&source_dir.join("a.txt"), "alpha");

        let cancel = CancelToken::new();
        cancel.cancel();

        let config = JobConfig {
            sources: vec![folder_source("tree", source_dir)],
            output: output.clone(),
        };
        let err = Job::run_config(config, &cancel).await.unwrap_err();

        assert!(err.is_canceled());
        // The output reset already happened; cancellation does not revert
        // it.
        assert!(output.is_dir());
        assert!(dir_entries(&output).is_empty());
    }

    #[tokio::test]
    async fn test_output_reset_replaces_stale_content() {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("src");
        let output = temp.path().join("out");

        write(&source_dir.join("fresh.txt"), "fresh");
        write(&output.join("stale/deep.txt"), "stale");

        let config = JobConfig {
            sources: vec![folder_source("tree", source_dir)],
            output: output.clone(),
        };
        Job::run_config(config, &CancelToken::new()).await.unwrap();

        assert!(!output.join("stale").exists());
        assert_eq!(fs::read_to_string(output.join("fresh.txt")).unwrap(), "fresh");
    }
}
