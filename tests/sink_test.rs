//! Tests for the table and blob sinks.

use std::sync::Arc;
use widget_consumer::error::Error;
use widget_consumer::model::{RawRequest, WidgetRecord};
use widget_consumer::sink::{BlobSink, TableSink, WidgetSink, blob_key};
use widget_consumer::storage::memory::{BlobOp, MemoryBlobStore, MemoryTable};
use widget_consumer::transform::transform;

fn record(id: &str, owner: &str) -> WidgetRecord {
    transform(RawRequest::create(id, owner).attribute("color", "red")).unwrap()
}

// ---------------------------------------------------------------------------
// Table sink
// ---------------------------------------------------------------------------

#[tokio::test]
async fn table_sink_upserts_by_id() {
    let table = MemoryTable::new();
    let sink = TableSink::new(Arc::new(table.clone()), "widgets");

    sink.put(&record("123", "John Doe")).await.unwrap();

    let item = table.item("widgets", "123").expect("stored item");
    assert_eq!(item.get("id").map(String::as_str), Some("123"));
    assert_eq!(item.get("owner").map(String::as_str), Some("John Doe"));
    assert_eq!(item.get("color").map(String::as_str), Some("red"));
}

#[tokio::test]
async fn table_sink_put_is_idempotent_per_id() {
    let table = MemoryTable::new();
    let sink = TableSink::new(Arc::new(table.clone()), "widgets");

    sink.put(&record("123", "John Doe")).await.unwrap();
    let mut updated = record("123", "John Doe");
    updated
        .attributes
        .insert("color".to_string(), "blue".to_string());
    sink.put(&updated).await.unwrap();

    assert_eq!(table.put_count(), 2);
    assert_eq!(table.len("widgets"), 1);
    let item = table.item("widgets", "123").unwrap();
    assert_eq!(item.get("color").map(String::as_str), Some("blue"));
}

#[tokio::test]
async fn table_sink_surfaces_storage_errors() {
    let table = MemoryTable::new();
    table.fail_puts("ProvisionedThroughputExceededException");
    let sink = TableSink::new(Arc::new(table.clone()), "widgets");

    let err = sink.put(&record("1", "A")).await.unwrap_err();
    assert!(matches!(err, Error::Storage { operation: "put_item", .. }));
    assert!(table.is_empty("widgets"));
}

#[test]
fn table_sink_describes_its_table() {
    let sink = TableSink::new(Arc::new(MemoryTable::new()), "widgets");
    assert_eq!(sink.describe(), "table:widgets");
}

// ---------------------------------------------------------------------------
// Blob sink
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blob_sink_writes_json_under_owner_key() {
    let store = MemoryBlobStore::new();
    let sink = BlobSink::new(Arc::new(store.clone()), "dest-bucket");

    sink.put(&record("123", "John Doe")).await.unwrap();

    let body = store
        .object("dest-bucket", "widgets/john-doe/123")
        .expect("blob written");
    let written: WidgetRecord = serde_json::from_slice(&body).unwrap();
    assert_eq!(written, record("123", "John Doe"));
    assert_eq!(store.count(BlobOp::Put), 1);
}

#[tokio::test]
async fn blob_sink_overwrites_existing_blob() {
    let store = MemoryBlobStore::new();
    let sink = BlobSink::new(Arc::new(store.clone()), "dest-bucket");

    sink.put(&record("5", "Ann Lee")).await.unwrap();
    let mut second = record("5", "Ann Lee");
    second.attributes.insert("color".to_string(), "green".to_string());
    sink.put(&second).await.unwrap();

    assert_eq!(store.keys("dest-bucket"), vec!["widgets/ann-lee/5".to_string()]);
    let body = store.object("dest-bucket", "widgets/ann-lee/5").unwrap();
    let written: WidgetRecord = serde_json::from_slice(&body).unwrap();
    assert_eq!(written.get("color"), Some("green"));
}

#[tokio::test]
async fn blob_sink_surfaces_storage_errors() {
    let store = MemoryBlobStore::new();
    store.fail(BlobOp::Put, "SlowDown");
    let sink = BlobSink::new(Arc::new(store.clone()), "dest-bucket");

    let err = sink.put(&record("1", "A")).await.unwrap_err();
    assert!(matches!(err, Error::Storage { operation: "put_object", .. }));
}

#[test]
fn blob_key_combines_owner_slug_and_id() {
    assert_eq!(blob_key(&record("123", "John Doe")), "widgets/john-doe/123");
}
