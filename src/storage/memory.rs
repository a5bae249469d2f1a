//! In-memory storage doubles.
//!
//! Both stores are cheap to clone and share state between clones, so a test
//! can hand one clone to the consumer and inspect another afterwards. Every
//! call is recorded, and a failure can be armed per operation to exercise the
//! fatal-error paths.

use super::{BlobStore, Item, KeyValueTable};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// A call made against a [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCall {
    List { bucket: String },
    Get { bucket: String, key: String },
    Delete { bucket: String, key: String },
    Put { bucket: String, key: String },
}

/// Blob operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    List,
    Get,
    Delete,
    Put,
}

#[derive(Default)]
struct Blobs {
    buckets: HashMap<String, BTreeMap<String, Bytes>>,
    calls: Vec<BlobCall>,
    failures: HashMap<BlobOp, String>,
}

/// Bucket store backed by sorted maps. Listing order is lexicographic by key,
/// which is what S3 returns as well.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<Blobs>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Blobs> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an object without recording a call.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.into());
    }

    /// Seed an object holding `value` serialized as JSON.
    pub fn insert_json<T: serde::Serialize>(&self, bucket: &str, key: &str, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        self.insert(bucket, key, body);
        Ok(())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Keys currently in `bucket`, in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<BlobCall> {
        self.lock().calls.clone()
    }

    /// Count of recorded calls of one kind.
    pub fn count(&self, op: BlobOp) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Make every subsequent `op` fail with `message` until [`Self::clear_failure`].
    pub fn fail(&self, op: BlobOp, message: impl Into<String>) {
        self.lock().failures.insert(op, message.into());
    }

    pub fn clear_failure(&self, op: BlobOp) {
        self.lock().failures.remove(&op);
    }
}

impl BlobCall {
    fn op(&self) -> BlobOp {
        match self {
            BlobCall::List { .. } => BlobOp::List,
            BlobCall::Get { .. } => BlobOp::Get,
            BlobCall::Delete { .. } => BlobOp::Delete,
            BlobCall::Put { .. } => BlobOp::Put,
        }
    }
}

impl Blobs {
    fn check(&self, op: BlobOp, operation: &'static str, target: &str) -> Result<()> {
        match self.failures.get(&op) {
            Some(message) => Err(Error::storage(operation, target, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn first_key(&self, bucket: &str) -> Result<Option<String>> {
        let mut blobs = self.lock();
        blobs.calls.push(BlobCall::List {
            bucket: bucket.to_string(),
        });
        blobs.check(BlobOp::List, "list_objects_v2", bucket)?;
        Ok(blobs
            .buckets
            .get(bucket)
            .and_then(|objects| objects.keys().next().cloned()))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let mut blobs = self.lock();
        blobs.calls.push(BlobCall::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let target = format!("{bucket}/{key}");
        blobs.check(BlobOp::Get, "get_object", &target)?;
        blobs
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| Error::storage("get_object", target, "NoSuchKey"))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let mut blobs = self.lock();
        blobs.calls.push(BlobCall::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        blobs.check(BlobOp::Delete, "delete_object", &format!("{bucket}/{key}"))?;
        if let Some(objects) = blobs.buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, _content_type: &str) -> Result<()> {
        let mut blobs = self.lock();
        blobs.calls.push(BlobCall::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        blobs.check(BlobOp::Put, "put_object", &format!("{bucket}/{key}"))?;
        blobs
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    tables: HashMap<String, BTreeMap<String, Item>>,
    puts: usize,
    failure: Option<String>,
}

/// Key-value table keyed by a single string attribute (`id` by default).
#[derive(Clone)]
pub struct MemoryTable {
    key_attribute: String,
    inner: Arc<Mutex<Tables>>,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::with_key("id")
    }
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key_attribute: impl Into<String>) -> Self {
        Self {
            key_attribute: key_attribute.into(),
            inner: Arc::new(Mutex::new(Tables::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn item(&self, table: &str, key: &str) -> Option<Item> {
        self.lock()
            .tables
            .get(table)
            .and_then(|items| items.get(key))
            .cloned()
    }

    /// Number of distinct items in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Number of `put_item` calls, failed ones included.
    pub fn put_count(&self) -> usize {
        self.lock().puts
    }

    /// Make every subsequent `put_item` fail with `message`.
    pub fn fail_puts(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }
}

#[async_trait]
impl KeyValueTable for MemoryTable {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let mut tables = self.lock();
        tables.puts += 1;
        if let Some(message) = &tables.failure {
            return Err(Error::storage("put_item", table, message));
        }
        let key = item.get(&self.key_attribute).cloned().ok_or_else(|| {
            Error::storage(
                "put_item",
                table,
                format!("item is missing key attribute {}", self.key_attribute),
            )
        })?;
        tables
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(key, item);
        Ok(())
    }
}
