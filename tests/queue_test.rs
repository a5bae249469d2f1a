//! Tests for reading requests off the queue bucket.

use serde_json::json;
use std::sync::Arc;
use widget_consumer::error::Error;
use widget_consumer::queue::QueueSource;
use widget_consumer::storage::memory::{BlobCall, BlobOp, MemoryBlobStore};

const BUCKET: &str = "requests";

fn queue(store: &MemoryBlobStore) -> QueueSource {
    QueueSource::new(Arc::new(store.clone()), BUCKET)
}

#[tokio::test]
async fn empty_queue_returns_none_without_read_or_delete() {
    let store = MemoryBlobStore::new();

    let next = queue(&store).take_next().await.unwrap();

    assert!(next.is_none());
    assert_eq!(
        store.calls(),
        vec![BlobCall::List {
            bucket: BUCKET.to_string()
        }]
    );
}

#[tokio::test]
async fn take_next_returns_parsed_request_and_deletes_it_once() {
    let store = MemoryBlobStore::new();
    store
        .insert_json(
            BUCKET,
            "req1",
            &json!({
                "type": "create",
                "widgetId": "123",
                "requestId": "abc",
                "owner": "John Doe",
                "otherAttributes": [{"name": "color", "value": "red"}]
            }),
        )
        .unwrap();

    let request = queue(&store).take_next().await.unwrap().expect("a request");

    assert_eq!(request.kind, "create");
    assert_eq!(request.widget_id().as_deref(), Some("123"));
    assert_eq!(request.field("requestId"), Some(&json!("abc")));
    assert_eq!(request.field("owner"), Some(&json!("John Doe")));
    assert_eq!(store.count(BlobOp::Delete), 1);
    assert!(store.calls().contains(&BlobCall::Delete {
        bucket: BUCKET.to_string(),
        key: "req1".to_string(),
    }));
    assert!(store.keys(BUCKET).is_empty());
}

#[tokio::test]
async fn take_next_follows_listing_order() {
    let store = MemoryBlobStore::new();
    store
        .insert_json(BUCKET, "b", &json!({"type": "delete", "widgetId": "2"}))
        .unwrap();
    store
        .insert_json(BUCKET, "a", &json!({"type": "delete", "widgetId": "1"}))
        .unwrap();

    let q = queue(&store);
    let first = q.take_next().await.unwrap().unwrap();
    let second = q.take_next().await.unwrap().unwrap();

    assert_eq!(first.widget_id().as_deref(), Some("1"));
    assert_eq!(second.widget_id().as_deref(), Some("2"));
    assert!(q.take_next().await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_payload_is_a_parse_error_and_stays_queued() {
    let store = MemoryBlobStore::new();
    store.insert(BUCKET, "bad", "not json {");

    let err = queue(&store).take_next().await.unwrap_err();

    assert!(matches!(err, Error::Parse { ref key, .. } if key == "bad"));
    assert_eq!(store.count(BlobOp::Delete), 0);
    assert_eq!(store.keys(BUCKET), vec!["bad".to_string()]);
}

#[tokio::test]
async fn payload_without_type_is_a_parse_error() {
    let store = MemoryBlobStore::new();
    store
        .insert_json(BUCKET, "req", &json!({"widgetId": "1"}))
        .unwrap();

    let err = queue(&store).take_next().await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[tokio::test]
async fn claim_next_leaves_object_until_acknowledged() {
    let store = MemoryBlobStore::new();
    store
        .insert_json(BUCKET, "req", &json!({"type": "create", "widgetId": "1"}))
        .unwrap();
    let q = queue(&store);

    let claim = q.claim_next().await.unwrap().unwrap();
    assert_eq!(claim.key, "req");
    assert_eq!(store.keys(BUCKET), vec!["req".to_string()]);

    q.acknowledge(&claim).await.unwrap();
    assert!(store.keys(BUCKET).is_empty());
}

#[tokio::test]
async fn storage_failure_on_list_propagates() {
    let store = MemoryBlobStore::new();
    store.fail(BlobOp::List, "AccessDenied");

    let err = queue(&store).take_next().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Storage { operation: "list_objects_v2", ref message, .. } if message == "AccessDenied"
    ));
}
