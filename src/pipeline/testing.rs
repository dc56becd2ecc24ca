//! In-memory stand-ins for the external tools, for end-to-end pipeline tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::{Pipeline, PipelineSettings, Toolchain};
use crate::existence::{IdempotencyCheck, PrefixExistenceCheck};
use crate::fetch::{DownloadRequest, Downloader};
use crate::media::AudioProfile;
use crate::separate::{
    expected_stem_path, AcceleratorProbe, Device, StemSeparator, Transcoder, VOCALS_STEM,
};
use crate::store::memory::MemoryStore;
use crate::store::ObjectStore;
use crate::{ArchiverError, Result};

pub(crate) const BUCKET: &str = "vtt-ds";

const TEMPLATE_SUFFIX: &str = "%(id)s.%(ext)s";

/// Writes `<id>.mp3` and `<id>.info.json` where yt-dlp would
#[derive(Clone, Default)]
pub(crate) struct FakeDownloader {
    fail: bool,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeDownloader {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        self.urls.lock().unwrap().push(request.url.clone());
        if self.fail {
            return Err(ArchiverError::Download("Video unavailable".to_string()));
        }

        let dir = PathBuf::from(request.output_template.trim_end_matches(TEMPLATE_SUFFIX));
        let id = request.url.rsplit("v=").next().unwrap_or_default();
        let audio = dir.join(format!("{}.{}", id, request.profile.format.as_str()));
        fs_err::write(audio, b"ID3original")?;
        fs_err::write(
            dir.join(format!("{}.info.json", id)),
            format!(r#"{{"id":"{}","title":"Fixture","duration":12,"formats":[]}}"#, id),
        )?;
        Ok(())
    }
}

/// Records the device and optionally writes the vocals stem
#[derive(Clone)]
pub(crate) struct FakeSeparator {
    write_vocals: bool,
    devices: Arc<Mutex<Vec<Device>>>,
}

impl FakeSeparator {
    pub(crate) fn new() -> Self {
        Self {
            write_vocals: true,
            devices: Arc::default(),
        }
    }

    /// Reports success without producing any stems
    pub(crate) fn without_output() -> Self {
        Self {
            write_vocals: false,
            ..Self::new()
        }
    }

    pub(crate) fn devices(&self) -> Vec<Device> {
        self.devices.lock().unwrap().clone()
    }
}

#[async_trait]
impl StemSeparator for FakeSeparator {
    fn model_name(&self) -> String {
        "mdx_extra_q".to_string()
    }

    async fn separate(&self, input: &Path, out_dir: &Path, device: Device) -> Result<()> {
        self.devices.lock().unwrap().push(device);
        if self.write_vocals {
            let stem = expected_stem_path(out_dir, &self.model_name(), input, VOCALS_STEM);
            if let Some(parent) = stem.parent() {
                fs_err::create_dir_all(parent)?;
            }
            fs_err::write(stem, b"RIFFvocals")?;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, _profile: AudioProfile) -> Result<()> {
        fs_err::copy(input, output).map_err(|e| ArchiverError::Processing(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeProbe {
    available: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeProbe {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AcceleratorProbe for FakeProbe {
    async fn is_available(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available
    }
}

/// Fakes plus a scratch root, with handles kept for assertions
pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) downloader: FakeDownloader,
    pub(crate) separator: FakeSeparator,
    pub(crate) probe: FakeProbe,
    temp_root: PathBuf,
    _root: TempDir,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self {
            store: Arc::new(MemoryStore::new()),
            downloader: FakeDownloader::default(),
            separator: FakeSeparator::new(),
            probe: FakeProbe::default(),
            temp_root: root.path().join("scratch"),
            _root: root,
        }
    }

    pub(crate) fn with_separator(separator: FakeSeparator) -> Self {
        Self {
            separator,
            ..Self::new()
        }
    }

    pub(crate) fn with_downloader(downloader: FakeDownloader) -> Self {
        Self {
            downloader,
            ..Self::new()
        }
    }

    pub(crate) fn with_store(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            ..Self::new()
        }
    }

    pub(crate) fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub(crate) fn pipeline(&self) -> Pipeline {
        let store: Arc<dyn ObjectStore> = self.store.clone();
        self.pipeline_with_check(Box::new(PrefixExistenceCheck::new(store, BUCKET)))
    }

    pub(crate) fn pipeline_with_check(&self, idempotency: Box<dyn IdempotencyCheck>) -> Pipeline {
        let tools = Toolchain {
            store: self.store.clone(),
            idempotency,
            downloader: Box::new(self.downloader.clone()),
            separator: Box::new(self.separator.clone()),
            transcoder: Box::new(CopyTranscoder),
            probe: Box::new(self.probe.clone()),
        };

        Pipeline::new(
            tools,
            PipelineSettings {
                bucket: BUCKET.to_string(),
                temp_root: self.temp_root.clone(),
                profile: AudioProfile::default(),
                show_progress: false,
            },
        )
    }
}
