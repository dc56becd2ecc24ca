use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use std::path::Path;

use super::{ObjectStore, StorageKey, TagSet};
use crate::config::Config;
use crate::media::content_type_for;
use crate::{ArchiverError, Result};

/// S3/MinIO implementation of [`ObjectStore`]
pub struct S3ObjectStore {
    client: S3Client,
    region: String,
}

impl S3ObjectStore {
    /// Build a client for the configured endpoint with static credentials
    pub async fn new(config: &Config) -> Self {
        let credentials = Credentials::new(
            config.storage.access_key.clone(),
            config.storage.secret_key.clone(),
            None,
            None,
            "vocal-archiver-config",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.storage.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.storage.force_path_style)
            .build();

        tracing::debug!("S3 client configured for {}", config.endpoint_url());

        Self {
            client: S3Client::from_conf(s3_config),
            region: config.storage.region.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(ArchiverError::Upload(format!(
                        "Failed to check bucket '{}': {}",
                        bucket,
                        aws_sdk_s3::error::DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the implicit default and rejects an explicit constraint
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false)
                {
                    tracing::debug!("Bucket '{}' already owned by us", bucket);
                    Ok(())
                } else {
                    Err(ArchiverError::Upload(format!(
                        "Failed to create bucket '{}': {}",
                        bucket,
                        aws_sdk_s3::error::DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn list_keys(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(limit)
            .send()
            .await;

        match output {
            Ok(output) => Ok(output
                .contents()
                .iter()
                .filter_map(|object| object.key().map(str::to_string))
                .collect()),
            // A missing bucket simply holds nothing yet
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_bucket())
                    .unwrap_or(false) =>
            {
                Ok(Vec::new())
            }
            Err(err) => Err(ArchiverError::Storage(format!(
                "Failed to list s3://{}/{}: {}",
                bucket,
                prefix,
                aws_sdk_s3::error::DisplayErrorContext(&err)
            ))),
        }
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &StorageKey,
        path: &Path,
        tags: Option<&TagSet>,
    ) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            ArchiverError::Upload(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key.as_str())
            .body(body)
            .content_type(content_type_for(path))
            .set_tagging(tags.map(TagSet::to_query))
            .send()
            .await
            .map_err(|e| {
                ArchiverError::Upload(format!(
                    "Failed to upload s3://{}/{}: {}",
                    bucket,
                    key,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}
