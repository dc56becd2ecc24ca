use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
    Opus,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Opus => "opus",
        }
    }

    /// Name yt-dlp's `--audio-format` expects. Its output keeps the `as_str` extension.
    pub fn yt_dlp_codec(&self) -> &'static str {
        match self {
            AudioFormat::Ogg => "vorbis",
            other => other.as_str(),
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            "opus" => Some(AudioFormat::Opus),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg | AudioFormat::Opus => "audio/ogg",
        }
    }

    /// ffmpeg encoder producing this format
    pub fn encoder(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::M4a => "aac",
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "libvorbis",
            AudioFormat::Opus => "libopus",
        }
    }
}

/// Codec and bitrate shared by every published audio artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProfile {
    pub format: AudioFormat,
    pub bitrate_kbps: u32,
}

impl Default for AudioProfile {
    fn default() -> Self {
        Self {
            format: AudioFormat::Mp3,
            bitrate_kbps: 192,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Original,
    Vocals,
}

/// An audio file sitting in the workspace, waiting to be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub local_path: PathBuf,
    pub kind: ArtifactKind,
}

impl AudioArtifact {
    pub fn new(local_path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            local_path: local_path.into(),
            kind,
        }
    }
}

/// Content type to send with an uploaded file
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if ext.eq_ignore_ascii_case("json") {
        return "application/json";
    }
    AudioFormat::from_extension(ext)
        .map(|format| format.mime_type())
        .unwrap_or("application/octet-stream")
}
