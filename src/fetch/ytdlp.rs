use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{DownloadRequest, Downloader};
use crate::{ArchiverError, Result};

/// Downloads audio with yt-dlp
pub struct YtDlpDownloader {
    yt_dlp_path: String,
}

impl YtDlpDownloader {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    fn build_args(request: &DownloadRequest) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            request.profile.format.yt_dlp_codec().to_string(),
            "--audio-quality".to_string(),
            format!("{}K", request.profile.bitrate_kbps),
            "--write-info-json".to_string(),
            "--no-write-thumbnail".to_string(),
            "--no-progress".to_string(),
            "--output".to_string(),
            request.output_template.clone(),
            request.url.clone(),
        ]
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        tracing::debug!("Running {} for {}", self.yt_dlp_path, request.url);

        let output = Command::new(&self.yt_dlp_path)
            .args(Self::build_args(request))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ArchiverError::Download(format!(
                    "could not run {}: {}. Please install it: https://github.com/yt-dlp/yt-dlp",
                    self.yt_dlp_path, e
                ))
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ArchiverError::Download(format!("yt-dlp failed: {}", error.trim())));
        }

        Ok(())
    }
}
