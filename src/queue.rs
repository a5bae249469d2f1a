//! Request queue on top of a blob bucket.
//!
//! Each pending request is one JSON object in the bucket. Listing order
//! approximates arrival order; nothing stronger is guaranteed. Deleting the
//! object is what consumes the request, and there is no redelivery.

use crate::error::{Error, Result};
use crate::model::RawRequest;
use crate::storage::BlobStore;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::debug;

/// A request read from the queue whose object has not been deleted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub key: String,
    pub request: RawRequest,
}

/// Reads pending requests out of one bucket.
#[derive(Clone)]
pub struct QueueSource {
    store: Arc<dyn BlobStore>,
    bucket: String,
}

impl QueueSource {
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Take the next pending request, deleting it from the bucket.
    ///
    /// Returns `None` without any read or delete when the bucket is empty.
    /// The object is gone once this returns, so a later failure loses it.
    ///
    /// # Errors
    ///
    /// Storage failures, and [`Error::Parse`] for a malformed body. A
    /// malformed object is not deleted.
    pub async fn take_next(&self) -> Result<Option<RawRequest>> {
        let Some(claim) = self.claim_next().await? else {
            return Ok(None);
        };
        self.acknowledge(&claim).await?;
        Ok(Some(claim.request))
    }

    /// Read and parse the next pending request without deleting it.
    pub async fn claim_next(&self) -> Result<Option<Claim>> {
        let key = self.store.first_key(&self.bucket).await?;
        self.record(if key.is_some() { "list" } else { "list_empty" });

        let Some(key) = key else {
            return Ok(None);
        };

        let body = self.store.get(&self.bucket, &key).await?;
        self.record("get");

        let request: RawRequest =
            serde_json::from_slice(&body).map_err(|source| Error::Parse {
                key: key.clone(),
                source,
            })?;
        debug!(bucket = %self.bucket, key = %key, kind = %request.kind, "read request");

        Ok(Some(Claim { key, request }))
    }

    /// Delete a claimed request's object, consuming it for good.
    pub async fn acknowledge(&self, claim: &Claim) -> Result<()> {
        self.store.delete(&self.bucket, &claim.key).await?;
        self.record("delete");
        Ok(())
    }

    fn record(&self, operation: &'static str) {
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("bucket", self.bucket.clone()),
                KeyValue::new("operation", operation),
            ],
        );
    }
}
