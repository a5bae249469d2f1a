//! Log lines emitted by the sinks and the consumer loop.
//!
//! Each test installs its own scoped subscriber that writes into a buffer,
//! so nothing touches the filesystem or the global dispatcher.

use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use widget_consumer::engine::{Backoff, ConsumerConfig, ConsumerLoop, Delivery};
use widget_consumer::model::RawRequest;
use widget_consumer::queue::QueueSource;
use widget_consumer::sink::{BlobSink, TableSink, WidgetSink};
use widget_consumer::storage::memory::{MemoryBlobStore, MemoryTable};
use widget_consumer::transform::transform;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[tokio::test]
async fn table_sink_logs_one_line_naming_id_and_table() {
    let (captured, _guard) = capture();
    let sink = TableSink::new(Arc::new(MemoryTable::new()), "widgets");
    let record = transform(RawRequest::create("123", "John Doe")).unwrap();

    sink.put(&record).await.unwrap();

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("123"));
    assert!(lines[0].contains("widgets"));
}

#[tokio::test]
async fn blob_sink_logs_one_line_naming_key() {
    let (captured, _guard) = capture();
    let sink = BlobSink::new(Arc::new(MemoryBlobStore::new()), "dest-bucket");
    let record = transform(RawRequest::create("123", "John Doe")).unwrap();

    sink.put(&record).await.unwrap();

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("widgets/john-doe/123"));
}

#[tokio::test]
async fn consumer_logs_skip_start_and_stop() {
    let (captured, _guard) = capture();
    let queue = MemoryBlobStore::new();
    queue
        .insert_json(
            "requests",
            "req",
            &serde_json::json!({"type": "delete", "widgetId": "999"}),
        )
        .unwrap();
    let sink: Arc<dyn WidgetSink> = Arc::new(TableSink::new(Arc::new(MemoryTable::new()), "t"));
    let consumer = ConsumerLoop::new(
        QueueSource::new(Arc::new(queue), "requests"),
        sink,
        ConsumerConfig {
            backoff: Backoff::Immediate,
            delivery: Delivery::AtMostOnce,
        },
    );

    consumer.process_next().await.unwrap();
    consumer.shutdown();
    consumer.run().await.unwrap();

    let lines = captured.lines();
    let skip = lines
        .iter()
        .find(|l| l.contains("skipping non-create request"))
        .expect("skip line");
    assert!(skip.contains("999"));
    assert!(skip.contains("delete"));
    assert!(lines.iter().any(|l| l.contains("consumer started")));
    assert!(lines.iter().any(|l| l.contains("consumer shutting down")));
}
