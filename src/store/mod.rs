use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[cfg(test)]
pub mod memory;
pub mod s3;

use crate::resolver::VideoIdentity;
use crate::Result;

/// Deterministic object key `{upload_folder}/{video_id}/{filename}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(upload_folder: &str, identity: &VideoIdentity, filename: &str) -> Self {
        Self(format!("{}{}", Self::prefix(upload_folder, identity), filename))
    }

    /// Prefix shared by every artifact of one video; the only deduplication handle
    pub fn prefix(upload_folder: &str, identity: &VideoIdentity) -> String {
        format!("{}/{}/", upload_folder.trim_matches('/'), identity.video_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object tags attached to the metadata upload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    /// `{processed: "false", language: <upload_folder>}`
    pub fn for_upload_folder(upload_folder: &str) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("processed".to_string(), "false".to_string());
        tags.insert("language".to_string(), upload_folder.to_string());
        Self(tags)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded `k=v&k=v` form used by the S3 tagging header
    pub fn to_query(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Narrow view of an S3-compatible object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create the bucket. Succeeds if it already exists and is ours.
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Keys under `prefix`, at most `limit` of them
    async fn list_keys(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>>;

    async fn upload_file(
        &self,
        bucket: &str,
        key: &StorageKey,
        path: &Path,
        tags: Option<&TagSet>,
    ) -> Result<()>;
}
