use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

pub mod demucs;
pub mod ffmpeg;
pub mod probe;

use crate::cli::DeviceSelection;
use crate::media::{ArtifactKind, AudioArtifact, AudioProfile};
use crate::workspace::Workspace;
use crate::{ArchiverError, Result};

/// Stem the separator is asked for
pub const VOCALS_STEM: &str = "vocals";

/// Extension of the stems written by the separation model
pub const STEM_EXTENSION: &str = "wav";

/// Directory inside the workspace that receives the separator's output tree
pub const SEPARATION_DIR: &str = "demucs_output";

/// Device the separation model runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports whether hardware acceleration is usable on this host
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AcceleratorProbe: Send + Sync {
    async fn is_available(&self) -> bool;
}

impl DeviceSelection {
    /// `cpu` never consults the probe; `gpu` fails without acceleration; `auto` falls back quietly
    pub async fn resolve(self, probe: &dyn AcceleratorProbe) -> Result<Device> {
        match self {
            DeviceSelection::Cpu => {
                tracing::info!("Using CPU for separation");
                Ok(Device::Cpu)
            }
            DeviceSelection::Gpu => {
                if probe.is_available().await {
                    tracing::info!("Using GPU for separation");
                    Ok(Device::Cuda)
                } else {
                    Err(ArchiverError::NoAcceleratorAvailable)
                }
            }
            DeviceSelection::Auto => {
                if probe.is_available().await {
                    tracing::info!("GPU detected, using GPU for separation");
                    Ok(Device::Cuda)
                } else {
                    tracing::info!("No GPU detected, using CPU for separation");
                    Ok(Device::Cpu)
                }
            }
        }
    }
}

/// External source-separation model.
///
/// Writes stems to `<out_dir>/<model>/<input basename>/<stem>.wav`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StemSeparator: Send + Sync {
    fn model_name(&self) -> String;

    async fn separate(&self, input: &Path, out_dir: &Path, device: Device) -> Result<()>;
}

/// External audio transcoder
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path, profile: AudioProfile) -> Result<()>;
}

/// Where the separator is expected to leave a stem for `input`
pub fn expected_stem_path(out_dir: &Path, model: &str, input: &Path, stem: &str) -> PathBuf {
    let basename = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir
        .join(model)
        .join(basename)
        .join(format!("{}.{}", stem, STEM_EXTENSION))
}

/// Vocal isolation stage: separate, locate the vocals stem, transcode it
pub struct VocalSeparator<'a> {
    separator: &'a dyn StemSeparator,
    transcoder: &'a dyn Transcoder,
    profile: AudioProfile,
}

impl<'a> VocalSeparator<'a> {
    pub fn new(
        separator: &'a dyn StemSeparator,
        transcoder: &'a dyn Transcoder,
        profile: AudioProfile,
    ) -> Self {
        Self {
            separator,
            transcoder,
            profile,
        }
    }

    pub async fn isolate_vocals(
        &self,
        input: &AudioArtifact,
        workspace: &Workspace,
        device: Device,
    ) -> Result<AudioArtifact> {
        let out_dir = workspace.join(SEPARATION_DIR);
        fs_err::create_dir_all(&out_dir)?;

        tracing::info!("Separating stems of {} on {}", input.local_path.display(), device);
        self.separator
            .separate(&input.local_path, &out_dir, device)
            .await?;

        let model = self.separator.model_name();
        let stem_path = expected_stem_path(&out_dir, &model, &input.local_path, VOCALS_STEM);
        if !stem_path.is_file() {
            return Err(ArchiverError::ArtifactNotFound(stem_path));
        }

        let basename = input
            .local_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| workspace.video_id().to_string());
        let vocals_path = workspace.join(format!(
            "{}_{}.{}",
            basename,
            VOCALS_STEM,
            self.profile.format.as_str()
        ));

        tracing::debug!("Transcoding {} to {}", stem_path.display(), vocals_path.display());
        self.transcoder
            .transcode(&stem_path, &vocals_path, self.profile)
            .await?;

        if !vocals_path.is_file() {
            return Err(ArchiverError::ArtifactNotFound(vocals_path));
        }

        Ok(AudioArtifact::new(vocals_path, ArtifactKind::Vocals))
    }
}
