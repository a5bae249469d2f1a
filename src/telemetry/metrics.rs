//! Metric instrument factories for widget-consumer.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"widget-consumer"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for widget-consumer instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("widget-consumer")
}

/// Counter: queue-level operations (list, list_empty, get, delete).
/// Labels: `bucket`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("widget.queue.operations")
        .with_description("Number of queue bucket operations")
        .build()
}

/// Counter: requests taken off the queue.
/// Labels: `kind`.
pub fn requests_consumed() -> Counter<u64> {
    meter()
        .u64_counter("widget.requests.consumed")
        .with_description("Number of requests taken off the queue")
        .build()
}

/// Counter: requests skipped because they are not creations.
/// Labels: `kind`.
pub fn requests_skipped() -> Counter<u64> {
    meter()
        .u64_counter("widget.requests.skipped")
        .with_description("Requests skipped as non-creation")
        .build()
}

/// Counter: widget records written to a sink.
/// Labels: `sink`.
pub fn records_stored() -> Counter<u64> {
    meter()
        .u64_counter("widget.records.stored")
        .with_description("Number of widget records stored")
        .build()
}

/// Histogram: sink write duration in milliseconds.
/// Labels: `sink`.
pub fn sink_put_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("widget.sink.put_duration_ms")
        .with_description("Sink write duration in milliseconds")
        .with_unit("ms")
        .build()
}
