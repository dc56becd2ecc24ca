//! Vocal Archiver - archive a YouTube video's audio track in S3-compatible storage
//!
//! This library resolves a video identity from a URL, skips videos that were already
//! archived, downloads the audio with yt-dlp, optionally isolates vocals with Demucs,
//! and publishes the audio plus curated metadata to an object store.

pub mod cli;
pub mod config;
pub mod existence;
pub mod fetch;
pub mod media;
pub mod pipeline;
pub mod publish;
pub mod resolver;
pub mod separate;
pub mod store;
pub mod utils;
pub mod workspace;

pub use cli::{Cli, DeviceSelection};
pub use config::Config;
pub use media::{ArtifactKind, AudioArtifact, AudioFormat, AudioProfile};
pub use pipeline::{JobRequest, Outcome, Pipeline};
pub use resolver::VideoIdentity;
pub use store::{ObjectStore, StorageKey, TagSet};

/// Result type used throughout the library
pub type Result<T, E = ArchiverError> = std::result::Result<T, E>;

/// Error kinds a pipeline run can fail with. Every one of them is fatal to the run.
#[derive(thiserror::Error, Debug)]
pub enum ArchiverError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("GPU requested but no hardware acceleration is available")]
    NoAcceleratorAvailable,

    #[error("Expected artifact not found at {}", .0.display())]
    ArtifactNotFound(std::path::PathBuf),

    #[error("Audio processing failed: {0}")]
    Processing(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Object store query failed: {0}")]
    Storage(String),

    #[error("Workspace I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
