use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{Device, StemSeparator};
use crate::{ArchiverError, Result};

/// Runs the Demucs CLI
pub struct DemucsSeparator {
    demucs_path: String,
    model: String,
    model_cache_dir: PathBuf,
}

impl DemucsSeparator {
    pub fn new(
        demucs_path: impl Into<String>,
        model: impl Into<String>,
        model_cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            demucs_path: demucs_path.into(),
            model: model.into(),
            model_cache_dir: model_cache_dir.into(),
        }
    }

    fn build_args(&self, input: &Path, out_dir: &Path, device: Device) -> Vec<String> {
        vec![
            "-n".to_string(),
            self.model.clone(),
            "-d".to_string(),
            device.as_str().to_string(),
            input.to_string_lossy().into_owned(),
            "--out".to_string(),
            out_dir.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl StemSeparator for DemucsSeparator {
    fn model_name(&self) -> String {
        self.model.clone()
    }

    async fn separate(&self, input: &Path, out_dir: &Path, device: Device) -> Result<()> {
        tracing::debug!(
            "Running {} with model {} (weights cached in {})",
            self.demucs_path,
            self.model,
            self.model_cache_dir.display()
        );

        let output = Command::new(&self.demucs_path)
            .args(self.build_args(input, out_dir, device))
            .env("TORCH_HOME", &self.model_cache_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ArchiverError::Processing(format!("could not run {}: {}", self.demucs_path, e))
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ArchiverError::Processing(format!(
                "Demucs exited with {}: {}",
                output.status,
                error.trim()
            )));
        }

        Ok(())
    }
}
