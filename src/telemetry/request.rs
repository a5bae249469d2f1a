//! Request dispatch span helpers.
//!
//! One span per request taken off the queue, carrying its kind and widget id.

use tracing::Span;

/// Start a span for dispatching one request.
///
/// The `request.outcome` field is declared empty and is filled in by
/// [`record_outcome`].
pub fn start_dispatch_span(kind: &str, widget_id: Option<&str>) -> Span {
    tracing::info_span!(
        "request.dispatch",
        "request.kind" = kind,
        "widget.id" = widget_id.unwrap_or("-"),
        "request.outcome" = tracing::field::Empty,
    )
}

/// Record how the request ended ("stored" or "skipped").
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("request.outcome", outcome);
}
