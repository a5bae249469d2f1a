//! Storage client seams.
//!
//! The queue and both sinks talk to remote storage through two small traits:
//! [`BlobStore`] (S3-style buckets) and [`KeyValueTable`] (DynamoDB-style
//! tables). Production implementations live in [`s3`] and [`dynamodb`];
//! [`memory`] holds in-process doubles for tests and local runs.

pub mod dynamodb;
pub mod memory;
pub mod s3;

use crate::config::AwsSettings;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// A flat item as stored in a key-value table: attribute name to string value.
pub type Item = BTreeMap<String, String>;

/// Object storage addressed by bucket and key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// First key in the bucket in listing order, or `None` if it is empty.
    async fn first_key(&self, bucket: &str) -> Result<Option<String>>;

    /// Full body of an object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Write an object, replacing any existing one at `key`.
    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str) -> Result<()>;
}

/// A key-value table that upserts whole items.
#[async_trait]
pub trait KeyValueTable: Send + Sync {
    /// Insert or replace the item with the same primary key.
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;
}

/// Load the shared AWS SDK configuration (default credential chain).
pub async fn load_sdk_config(settings: &AwsSettings) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new(settings.region.clone()))
        .load()
        .await
}
