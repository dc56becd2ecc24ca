use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::DeviceSelection;
use crate::config::Config;
use crate::existence::{IdempotencyCheck, PrefixExistenceCheck};
use crate::fetch::ytdlp::YtDlpDownloader;
use crate::fetch::{Downloader, Fetcher};
use crate::media::AudioProfile;
use crate::publish::Publisher;
use crate::resolver::{self, VideoIdentity};
use crate::separate::demucs::DemucsSeparator;
use crate::separate::ffmpeg::FfmpegTranscoder;
use crate::separate::probe::TorchCudaProbe;
use crate::separate::{AcceleratorProbe, Device, StemSeparator, Transcoder, VocalSeparator};
use crate::store::s3::S3ObjectStore;
use crate::store::{ObjectStore, StorageKey, TagSet};
use crate::utils;
use crate::workspace::Workspace;
use crate::Result;

#[cfg(test)]
pub(crate) mod testing;

/// One invocation's worth of work
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub url: String,
    pub upload_folder: String,
    pub separate_vocals: bool,
    pub device: DeviceSelection,
}

/// How a run ended when it did not fail
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Objects already exist under the video's prefix; nothing was done
    AlreadyProcessed { identity: VideoIdentity },

    /// Artifacts uploaded, metadata last
    Published {
        identity: VideoIdentity,
        keys: Vec<StorageKey>,
        started_at: DateTime<Utc>,
        elapsed: chrono::Duration,
    },
}

/// External collaborators used by the pipeline
pub struct Toolchain {
    pub store: Arc<dyn ObjectStore>,
    pub idempotency: Box<dyn IdempotencyCheck>,
    pub downloader: Box<dyn Downloader>,
    pub separator: Box<dyn StemSeparator>,
    pub transcoder: Box<dyn Transcoder>,
    pub probe: Box<dyn AcceleratorProbe>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub bucket: String,

    /// Root under which per-video workspaces are allocated
    pub temp_root: PathBuf,

    pub profile: AudioProfile,

    /// Show spinners around external tool runs
    pub show_progress: bool,
}

/// Resolve, check, fetch, separate, publish, clean up
pub struct Pipeline {
    tools: Toolchain,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(tools: Toolchain, settings: PipelineSettings) -> Self {
        Self { tools, settings }
    }

    /// Wire the real tools and the S3 store from configuration
    pub async fn from_config(config: &Config, show_progress: bool) -> Self {
        let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(config).await);
        let app = &config.app;

        let tools = Toolchain {
            idempotency: Box::new(PrefixExistenceCheck::new(
                store.clone(),
                config.storage.bucket.clone(),
            )),
            store,
            downloader: Box::new(YtDlpDownloader::new(app.tools.yt_dlp.clone())),
            separator: Box::new(DemucsSeparator::new(
                app.tools.demucs.clone(),
                app.separation_model.clone(),
                app.model_cache_dir.clone(),
            )),
            transcoder: Box::new(FfmpegTranscoder::new(app.tools.ffmpeg.clone())),
            probe: Box::new(TorchCudaProbe::new(app.tools.python.clone())),
        };

        let settings = PipelineSettings {
            bucket: config.storage.bucket.clone(),
            temp_root: app.temp_dir.clone(),
            profile: config.audio_profile(),
            show_progress,
        };

        Self::new(tools, settings)
    }

    pub async fn run(&self, request: &JobRequest) -> Result<Outcome> {
        let started_at = Utc::now();

        let identity = resolver::resolve(&request.url)?;
        tracing::info!("Processing video {} ({})", identity, identity.canonical_url());

        // Settle the device before touching the network so a missing GPU costs nothing
        let device = if request.separate_vocals {
            Some(request.device.resolve(self.tools.probe.as_ref()).await?)
        } else {
            None
        };

        if self
            .tools
            .idempotency
            .already_processed(&request.upload_folder, &identity)
            .await?
        {
            tracing::info!(
                "Video {} already exists in {}/{}. Skipping download and upload.",
                identity,
                self.settings.bucket,
                request.upload_folder
            );
            return Ok(Outcome::AlreadyProcessed { identity });
        }

        let workspace = Workspace::create(&self.settings.temp_root, &identity)?;

        match self.process(&identity, &workspace, request, device).await {
            Ok(keys) => {
                if let Err(e) = workspace.close() {
                    tracing::warn!("Failed to clean up workspace: {}", e);
                }
                Ok(Outcome::Published {
                    identity,
                    keys,
                    started_at,
                    elapsed: Utc::now() - started_at,
                })
            }
            Err(e) => {
                tracing::debug!("Removing workspace {} after failure", workspace.path().display());
                drop(workspace);
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        identity: &VideoIdentity,
        workspace: &Workspace,
        request: &JobRequest,
        device: Option<Device>,
    ) -> Result<Vec<StorageKey>> {
        let show = self.settings.show_progress;

        let progress = utils::spinner("Downloading audio with yt-dlp...", show);
        let fetched = Fetcher::new(self.tools.downloader.as_ref(), self.settings.profile)
            .fetch(identity, workspace)
            .await;
        progress.finish_and_clear();
        let fetched = fetched?;

        let mut audio = vec![fetched.audio];

        if let Some(device) = device {
            let progress = utils::spinner(format!("Separating vocals on {}...", device), show);
            let vocals = VocalSeparator::new(
                self.tools.separator.as_ref(),
                self.tools.transcoder.as_ref(),
                self.settings.profile,
            )
            .isolate_vocals(&audio[0], workspace, device)
            .await;
            progress.finish_and_clear();

            let vocals = vocals?;
            tracing::info!("Vocals file saved at {}", vocals.local_path.display());
            audio.push(vocals);
        }

        let tags = TagSet::for_upload_folder(&request.upload_folder);
        let progress = utils::spinner("Uploading artifacts...", show);
        let keys = Publisher::new(self.tools.store.as_ref(), &self.settings.bucket)
            .publish(&audio, &fetched.metadata_path, &request.upload_folder, identity, &tags)
            .await;
        progress.finish_and_clear();

        keys
    }
}
