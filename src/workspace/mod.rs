use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::resolver::VideoIdentity;
use crate::Result;

/// Per-video scratch directory.
///
/// The directory is removed when the value is dropped, so every exit path out
/// of a run, success or error, releases it.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    video_id: String,
}

impl Workspace {
    /// Allocate `<root>/temp_<video_id>_<random>`, creating the root if needed
    pub fn create(root: &Path, identity: &VideoIdentity) -> Result<Self> {
        fs_err::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("temp_{}_", identity.video_id()))
            .tempdir_in(root)?;

        tracing::debug!("Created workspace {}", dir.path().display());

        Ok(Self {
            dir,
            video_id: identity.video_id().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Remove the directory now and report failures instead of swallowing them
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::info!("Temporary files cleaned up from {}", path.display());
        Ok(())
    }
}
