use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Upload folder used when none is given on the command line
pub const DEFAULT_UPLOAD_FOLDER: &str = "ar";

#[derive(Parser, Debug)]
#[command(
    name = "vocal-archiver",
    about = "Vocal Archiver - Download YouTube audio, isolate vocals, \
             and upload to S3-compatible storage",
    version,
    long_about = "Downloads the audio track of a single YouTube video with yt-dlp, \
                  optionally separates the vocals with Demucs, and uploads the audio \
                  files plus curated metadata to MinIO/S3. Videos that were already \
                  archived under the same folder are skipped."
)]
pub struct Cli {
    /// YouTube video URL (watch, youtu.be, embed, v, or shorts links)
    #[arg(value_name = "YOUTUBE_URL", required_unless_present = "show_config")]
    pub youtube_url: Option<String>,

    /// Upload folder in the bucket, also used as the language tag
    #[arg(value_name = "UPLOAD_FOLDER", default_value = DEFAULT_UPLOAD_FOLDER)]
    pub upload_folder: String,

    /// Skip vocal separation
    #[arg(long)]
    pub no_vocals: bool,

    /// Device to use for vocal separation
    #[arg(long, value_enum, default_value = "auto")]
    pub device: DeviceSelection,

    /// Configuration file (defaults to ./config.yaml, then the user config directory)
    #[arg(long, value_name = "FILE", env = "ARCHIVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Object store endpoint (host:port)
    #[arg(long, env = "ARCHIVER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Object store access key
    #[arg(long, env = "ARCHIVER_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// Object store secret key
    #[arg(long, env = "ARCHIVER_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Target bucket
    #[arg(long, env = "ARCHIVER_BUCKET")]
    pub bucket: Option<String>,

    /// Use HTTPS when talking to the object store
    #[arg(long, env = "ARCHIVER_SECURE")]
    pub secure: Option<bool>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Requested device for the separation model
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeviceSelection {
    /// Use the GPU when available, otherwise the CPU
    #[default]
    Auto,
    /// Always run on the CPU
    Cpu,
    /// Require a GPU; fail when none is available
    Gpu,
}

impl std::fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceSelection::Auto => write!(f, "auto"),
            DeviceSelection::Cpu => write!(f, "cpu"),
            DeviceSelection::Gpu => write!(f, "gpu"),
        }
    }
}
