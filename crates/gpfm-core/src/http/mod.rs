//! HTTP access for release metadata and remote archives.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpError};
