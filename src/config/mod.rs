use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::media::{AudioFormat, AudioProfile};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Object store configuration
    pub storage: StorageConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Endpoint as host:port, without scheme
    pub endpoint: String,

    /// Use HTTPS for the endpoint
    pub secure: bool,

    pub access_key: String,

    pub secret_key: String,

    /// Bucket holding all archived videos
    pub bucket: String,

    /// Region sent with signed requests
    pub region: String,

    /// Address buckets as path segments (required by MinIO)
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for per-video scratch workspaces
    pub temp_dir: PathBuf,

    /// Cache for separation model weights
    pub model_cache_dir: PathBuf,

    /// Demucs model name
    pub separation_model: String,

    /// Codec for the published audio artifacts
    pub audio_format: AudioFormat,

    /// Bitrate for the published audio artifacts
    pub audio_bitrate_kbps: u32,

    /// External tool locations
    pub tools: ToolPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub yt_dlp: String,
    pub demucs: String,
    pub ffmpeg: String,

    /// Interpreter used to ask torch whether CUDA is available
    pub python: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            secure: false,
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: "vtt-ds".to_string(),
            region: "us-east-1".to_string(),
            force_path_style: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp_downloads"),
            model_cache_dir: PathBuf::from("models_cache"),
            separation_model: "mdx_extra_q".to_string(),
            audio_format: AudioFormat::Mp3,
            audio_bitrate_kbps: 192,
            tools: ToolPaths::default(),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            demucs: "demucs".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            python: "python3".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when none exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::config_path().filter(|path| path.exists()),
        };

        let config = match config_path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path).context("Failed to read config file")?;
                serde_yaml::from_str(&content).context("Failed to parse config file")?
            }
            None => Self::default(),
        };

        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("vocal-archiver").join("config.yaml"))
    }

    /// Apply command line / environment overrides
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.storage.endpoint = endpoint.clone();
        }
        if let Some(access_key) = &cli.access_key {
            self.storage.access_key = access_key.clone();
        }
        if let Some(secret_key) = &cli.secret_key {
            self.storage.secret_key = secret_key.clone();
        }
        if let Some(bucket) = &cli.bucket {
            self.storage.bucket = bucket.clone();
        }
        if let Some(secure) = cli.secure {
            self.storage.secure = secure;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.is_empty() {
            anyhow::bail!("Storage bucket must be configured");
        }
        if self.storage.endpoint.is_empty() {
            anyhow::bail!("Storage endpoint must be configured");
        }
        if self.app.audio_bitrate_kbps == 0 {
            anyhow::bail!("Audio bitrate must be greater than zero");
        }

        Ok(())
    }

    /// Full endpoint URL including scheme
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.storage.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.storage.endpoint)
    }

    pub fn audio_profile(&self) -> AudioProfile {
        AudioProfile {
            format: self.app.audio_format,
            bitrate_kbps: self.app.audio_bitrate_kbps,
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Endpoint: {}", self.endpoint_url());
        println!("  Bucket: {}", self.storage.bucket);
        println!("  Region: {}", self.storage.region);
        println!("  Access Key: {}", self.storage.access_key);
        println!("  Secret Key: {}", mask(&self.storage.secret_key));
        println!("  Scratch Root: {}", self.app.temp_dir.display());
        println!("  Model Cache: {}", self.app.model_cache_dir.display());
        println!("  Separation Model: {}", self.app.separation_model);
        println!(
            "  Audio: {} @ {}k",
            self.app.audio_format.as_str(),
            self.app.audio_bitrate_kbps
        );
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "*".repeat(secret.len().min(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "storage:\n  bucket: archive\napp:\n  audio_bitrate_kbps: 320\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.bucket, "archive");
        assert_eq!(config.storage.endpoint, "localhost:9000");
        assert_eq!(config.app.audio_bitrate_kbps, 320);
        assert_eq!(config.app.separation_model, "mdx_extra_q");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "storage:\n  secure: true\n  endpoint: s3.example.com\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.endpoint_url(), "https://s3.example.com");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let cli = Cli::try_parse_from([
            "vocal-archiver",
            "https://youtu.be/ABCDEFGHIJK",
            "--bucket",
            "other",
            "--endpoint",
            "minio:9000",
        ])
        .unwrap();
        let mut config = Config::default();
        config.apply_overrides(&cli);
        assert_eq!(config.storage.bucket, "other");
        assert_eq!(config.endpoint_url(), "http://minio:9000");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.storage.bucket.clear();
        assert!(config.validate().is_err());
    }
}
