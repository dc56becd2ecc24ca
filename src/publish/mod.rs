use std::path::Path;

use crate::media::AudioArtifact;
use crate::resolver::VideoIdentity;
use crate::store::{ObjectStore, StorageKey, TagSet};
use crate::utils;
use crate::{ArchiverError, Result};

/// Uploads a finished artifact set under `{upload_folder}/{video_id}/`
pub struct Publisher<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str) -> Self {
        Self { store, bucket }
    }

    /// Audio goes up first, untagged; the tagged metadata object goes last and
    /// marks the set as complete. Nothing is rolled back on failure.
    pub async fn publish(
        &self,
        audio: &[AudioArtifact],
        metadata_path: &Path,
        upload_folder: &str,
        identity: &VideoIdentity,
        tags: &TagSet,
    ) -> Result<Vec<StorageKey>> {
        self.ensure_bucket().await?;

        let mut keys = Vec::with_capacity(audio.len() + 1);
        for artifact in audio {
            let key = StorageKey::new(upload_folder, identity, &file_name(&artifact.local_path)?);
            self.store
                .upload_file(self.bucket, &key, &artifact.local_path, None)
                .await?;
            tracing::info!(
                "Uploaded audio to {}/{} ({})",
                self.bucket,
                key,
                utils::file_size_of(&artifact.local_path)
            );
            keys.push(key);
        }

        let key = StorageKey::new(upload_folder, identity, &file_name(metadata_path)?);
        self.store
            .upload_file(self.bucket, &key, metadata_path, Some(tags))
            .await?;
        tracing::info!(
            "Uploaded metadata to {}/{} with tags {}",
            self.bucket,
            key,
            tags.to_query()
        );
        keys.push(key);

        Ok(keys)
    }

    async fn ensure_bucket(&self) -> Result<()> {
        if self.store.bucket_exists(self.bucket).await? {
            tracing::debug!("Bucket '{}' already exists", self.bucket);
        } else {
            self.store.create_bucket(self.bucket).await?;
            tracing::info!("Bucket '{}' created", self.bucket);
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiverError::Upload(format!("{} has no file name", path.display())))
}
