use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::{ArchiverError, Result};

/// Unstructured metadata as written by the download tool
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadata(Value);

impl RawMetadata {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Load the `.info.json` sidecar
    pub fn from_sidecar(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).map_err(|e| {
            ArchiverError::Download(format!("metadata sidecar unreadable: {}", e))
        })?;
        let value = serde_json::from_str(&content).map_err(|e| {
            ArchiverError::Download(format!(
                "metadata sidecar {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self(value))
    }

    /// Value of a top-level field, copied as-is; absent or non-object root gives `None`
    fn field(&self, field: &str) -> Option<Value> {
        self.0.get(field).filter(|value| !value.is_null()).cloned()
    }
}

/// Fixed-schema projection of [`RawMetadata`]. Field order is the on-disk order.
///
/// Values are carried over untouched, whatever their JSON type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CuratedMetadata {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub uploader: Option<Value>,
    pub upload_date: Option<Value>,
    pub duration: Option<Value>,
    pub view_count: Option<Value>,
    pub like_count: Option<Value>,
    pub channel_id: Option<Value>,
    pub channel_url: Option<Value>,
    pub webpage_url: Option<Value>,
    pub tags: Option<Value>,
    pub categories: Option<Value>,
}

impl CuratedMetadata {
    /// Project raw metadata. Missing fields become null.
    pub fn curate(raw: &RawMetadata) -> Self {
        Self {
            id: raw.field("id"),
            title: raw.field("title"),
            uploader: raw.field("uploader"),
            upload_date: raw.field("upload_date"),
            duration: raw.field("duration"),
            view_count: raw.field("view_count"),
            like_count: raw.field("like_count"),
            channel_id: raw.field("channel_id"),
            channel_url: raw.field("channel_url"),
            webpage_url: raw.field("webpage_url"),
            tags: raw.field("tags"),
            categories: raw.field("categories"),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(Value::as_str)
    }

    /// UTF-8 JSON with four-space indentation and non-ASCII text kept as-is
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| ArchiverError::Io(std::io::Error::other(e)))?;
        Ok(out)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs_err::write(path, self.to_json_bytes()?)?;
        Ok(())
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.as_ref().and_then(Value::as_f64)
    }
}
