use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use super::{ObjectStore, StorageKey, TagSet};
use crate::{ArchiverError, Result};

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub tags: Option<TagSet>,
}

/// Store operation, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CreateBucket(String),
    List(String),
    Upload { key: String, tagged: bool },
}

#[derive(Default)]
struct State {
    buckets: BTreeSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    events: Vec<StoreEvent>,
    uploads_before_failure: Option<usize>,
}

/// In-process object store that records every call
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `count` uploads succeed, then fail every following one
    pub fn fail_uploads_after(self, count: usize) -> Self {
        self.lock().uploads_before_failure = Some(count);
        self
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.lock().events.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, StoreEvent::Upload { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.lock().buckets.contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        state.buckets.insert(bucket.to_string());
        state.events.push(StoreEvent::CreateBucket(bucket.to_string()));
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.events.push(StoreEvent::List(prefix.to_string()));
        Ok(state
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .take(limit.max(0) as usize)
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &StorageKey,
        path: &Path,
        tags: Option<&TagSet>,
    ) -> Result<()> {
        let bytes = fs_err::read(path).map_err(|e| ArchiverError::Upload(e.to_string()))?;

        let mut state = self.lock();
        if !state.buckets.contains(bucket) {
            return Err(ArchiverError::Upload(format!("no such bucket: {}", bucket)));
        }
        if let Some(remaining) = state.uploads_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(ArchiverError::Upload(format!("injected failure for {}", key)));
            }
            *remaining -= 1;
        }

        state.events.push(StoreEvent::Upload {
            key: key.to_string(),
            tagged: tags.is_some(),
        });
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                tags: tags.cloned(),
            },
        );
        Ok(())
    }
}
