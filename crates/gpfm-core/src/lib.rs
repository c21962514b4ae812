pub mod cancel;
pub mod downloader;
pub mod error;
pub mod github;
pub mod http;
pub mod job;
pub mod merge;
pub mod progress;
pub mod source;
pub mod staging;

pub use cancel::CancelToken;
pub use downloader::{ArchiveExtractor, FileDownloader};
pub use error::{Error, Result};
pub use github::{GitHubAsset, GitHubClient, GitHubRelease};
pub use http::{HttpClient, HttpClientConfig, HttpError};
pub use job::Job;
pub use source::{FileSource, FolderSource, GitHubSource, JobConfig, Source, UrlSource};
pub use staging::StagingArea;
