//! Durable destinations for widget records.
//!
//! Two interchangeable sinks, chosen once at startup from a
//! [`SinkTarget`](crate::config::SinkTarget): [`TableSink`] upserts into a
//! key-value table, [`BlobSink`] writes a JSON object per widget. Neither
//! retries; storage errors go straight back to the caller.

use crate::error::Result;
use crate::model::WidgetRecord;
use crate::storage::{BlobStore, KeyValueTable};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

/// Somewhere a [`WidgetRecord`] can be stored.
#[async_trait]
pub trait WidgetSink: Send + Sync {
    /// Short description of the destination, e.g. `table:widgets`.
    fn describe(&self) -> String;

    /// Store `record`, replacing any earlier record with the same id.
    async fn put(&self, record: &WidgetRecord) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Table sink
// ---------------------------------------------------------------------------

pub struct TableSink {
    table: Arc<dyn KeyValueTable>,
    name: String,
}

impl TableSink {
    pub fn new(table: Arc<dyn KeyValueTable>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }
}

#[async_trait]
impl WidgetSink for TableSink {
    fn describe(&self) -> String {
        format!("table:{}", self.name)
    }

    async fn put(&self, record: &WidgetRecord) -> Result<()> {
        self.table.put_item(&self.name, record.to_item()).await?;
        info!(widget_id = %record.id, table = %self.name, "stored widget in table");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob sink
// ---------------------------------------------------------------------------

pub struct BlobSink {
    store: Arc<dyn BlobStore>,
    bucket: String,
}

impl BlobSink {
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl WidgetSink for BlobSink {
    fn describe(&self) -> String {
        format!("bucket:{}", self.bucket)
    }

    async fn put(&self, record: &WidgetRecord) -> Result<()> {
        let key = blob_key(record);
        let body = Bytes::from(serde_json::to_vec(record)?);
        self.store
            .put(&self.bucket, &key, body, "application/json")
            .await?;
        info!(key = %key, bucket = %self.bucket, "stored widget blob");
        Ok(())
    }
}

/// Object key for a widget: `widgets/{slug(owner)}/{id}`.
pub fn blob_key(record: &WidgetRecord) -> String {
    format!("widgets/{}/{}", slug(&record.owner), record.id)
}

/// Lower-case `owner` and turn spaces into hyphens.
pub fn slug(owner: &str) -> String {
    owner.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slug("John Doe"), "john-doe");
        assert_eq!(slug("ACME"), "acme");
        assert_eq!(slug("a  b"), "a--b");
    }

    #[test]
    fn blob_key_uses_owner_slug_and_id() {
        let record = WidgetRecord {
            id: "123".to_string(),
            owner: "John Doe".to_string(),
            attributes: BTreeMap::new(),
        };
        assert_eq!(blob_key(&record), "widgets/john-doe/123");
    }
}
