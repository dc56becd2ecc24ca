use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::AcceleratorProbe;

const CUDA_CHECK: &str = "import sys, torch; sys.exit(0 if torch.cuda.is_available() else 1)";

/// Asks the separator's own torch runtime whether CUDA is usable
pub struct TorchCudaProbe {
    python_path: String,
}

impl TorchCudaProbe {
    pub fn new(python_path: impl Into<String>) -> Self {
        Self {
            python_path: python_path.into(),
        }
    }
}

#[async_trait]
impl AcceleratorProbe for TorchCudaProbe {
    async fn is_available(&self) -> bool {
        let status = Command::new(&self.python_path)
            .args(["-c", CUDA_CHECK])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!("Could not run {} to probe for CUDA: {}", self.python_path, e);
                false
            }
        }
    }
}
