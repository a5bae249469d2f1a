//! S3-backed [`BlobStore`].

use super::BlobStore;
use crate::config::AwsSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

/// Blob store over an S3 (or S3-compatible) endpoint.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    /// Build a client from the shared SDK config, applying endpoint overrides.
    pub fn new(sdk_config: &aws_config::SdkConfig, settings: &AwsSettings) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn first_key(&self, bucket: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| Error::storage("list_objects_v2", bucket, DisplayErrorContext(&e)))?;

        Ok(resp
            .contents()
            .first()
            .and_then(|object| object.key())
            .map(str::to_string))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let target = format!("{bucket}/{key}");
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::storage("get_object", &target, DisplayErrorContext(&e)))?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::storage("get_object", &target, e))?;
        Ok(body.into_bytes())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::storage("delete_object", format!("{bucket}/{key}"), DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                Error::storage("put_object", format!("{bucket}/{key}"), DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}
