use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::resolver::VideoIdentity;
use crate::store::{ObjectStore, StorageKey};
use crate::Result;

/// Pre-flight test that decides whether a video was already archived
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdempotencyCheck: Send + Sync {
    async fn already_processed(
        &self,
        upload_folder: &str,
        identity: &VideoIdentity,
    ) -> Result<bool>;
}

/// Treats any object under `{upload_folder}/{video_id}/` as a finished run.
///
/// This does not verify that the full artifact set exists, so an interrupted
/// upload from an earlier run is reported as complete.
pub struct PrefixExistenceCheck {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl PrefixExistenceCheck {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl IdempotencyCheck for PrefixExistenceCheck {
    async fn already_processed(
        &self,
        upload_folder: &str,
        identity: &VideoIdentity,
    ) -> Result<bool> {
        let prefix = StorageKey::prefix(upload_folder, identity);
        let keys = self.store.list_keys(&self.bucket, &prefix, 1).await?;

        match keys.first() {
            Some(key) => {
                tracing::debug!("Found existing object {} under {}", key, prefix);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
