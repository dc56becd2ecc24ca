use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

pub mod metadata;
pub mod ytdlp;

pub use metadata::{CuratedMetadata, RawMetadata};

use crate::media::{ArtifactKind, AudioArtifact, AudioProfile};
use crate::resolver::VideoIdentity;
use crate::utils;
use crate::workspace::Workspace;
use crate::{ArchiverError, Result};

/// What the download tool is asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Canonical watch URL
    pub url: String,

    /// Output template, e.g. `<workspace>/%(id)s.%(ext)s`
    pub output_template: String,

    /// Codec/bitrate for the extracted audio
    pub profile: AudioProfile,
}

/// External download + audio extraction tool.
///
/// Implementations must disable playlist expansion, pick the best audio
/// stream, transcode to `profile`, and write an `<id>.info.json` sidecar next
/// to the audio file.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, request: &DownloadRequest) -> Result<()>;
}

/// Files produced by the fetch stage, all inside the workspace
#[derive(Debug, Clone)]
pub struct FetchOutput {
    pub audio: AudioArtifact,
    pub metadata_path: PathBuf,
    pub metadata: CuratedMetadata,
}

/// Downloads audio and writes curated metadata into a workspace
pub struct Fetcher<'a> {
    downloader: &'a dyn Downloader,
    profile: AudioProfile,
}

impl<'a> Fetcher<'a> {
    pub fn new(downloader: &'a dyn Downloader, profile: AudioProfile) -> Self {
        Self { downloader, profile }
    }

    pub async fn fetch(
        &self,
        identity: &VideoIdentity,
        workspace: &Workspace,
    ) -> Result<FetchOutput> {
        let video_id = identity.video_id();
        let request = DownloadRequest {
            url: identity.canonical_url(),
            output_template: workspace.join("%(id)s.%(ext)s").to_string_lossy().into_owned(),
            profile: self.profile,
        };

        tracing::info!("Downloading audio and metadata for {}", request.url);
        self.downloader.download(&request).await?;

        let audio_path = workspace.join(format!("{}.{}", video_id, self.profile.format.as_str()));
        if !audio_path.is_file() {
            return Err(ArchiverError::Download(format!(
                "download reported success but {} is missing",
                audio_path.display()
            )));
        }

        let sidecar_path = workspace.join(format!("{}.info.json", video_id));
        let raw = RawMetadata::from_sidecar(&sidecar_path)?;
        let metadata = CuratedMetadata::curate(&raw);

        let metadata_path = workspace.join(format!("{}_metadata.json", video_id));
        metadata.write_to(&metadata_path)?;

        tracing::info!(
            "Fetched '{}' ({}, {})",
            metadata.title().unwrap_or(video_id),
            metadata
                .duration_seconds()
                .map(utils::format_duration)
                .unwrap_or_else(|| "unknown duration".to_string()),
            utils::file_size_of(&audio_path)
        );

        Ok(FetchOutput {
            audio: AudioArtifact::new(audio_path, ArtifactKind::Original),
            metadata_path,
            metadata,
        })
    }
}
