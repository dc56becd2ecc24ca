use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::Transcoder;
use crate::media::AudioProfile;
use crate::{ArchiverError, Result};

/// Transcodes audio with ffmpeg
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn build_args(input: &Path, output: &Path, profile: AudioProfile) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-codec:a".to_string(),
            profile.format.encoder().to_string(),
            "-b:a".to_string(),
            format!("{}k", profile.bitrate_kbps),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, profile: AudioProfile) -> Result<()> {
        let result = Command::new(&self.ffmpeg_path)
            .args(Self::build_args(input, output, profile))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ArchiverError::Processing(format!("could not run {}: {}", self.ffmpeg_path, e))
            })?;

        if !result.status.success() {
            let error = String::from_utf8_lossy(&result.stderr);
            return Err(ArchiverError::Processing(format!(
                "ffmpeg failed converting {}: {}",
                input.display(),
                error.trim()
            )));
        }

        Ok(())
    }
}
