//! Consumer loop: take a request, transform it, store it, repeat.

use super::backoff::Backoff;
use crate::error::{Error, Result};
use crate::model::{RawRequest, WidgetRecord};
use crate::queue::QueueSource;
use crate::sink::WidgetSink;
use crate::telemetry::metrics;
use crate::telemetry::request::{record_outcome, start_dispatch_span};
use crate::transform::transform;
use opentelemetry::KeyValue;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Notify;
use tracing::{Instrument, error, info};

/// When a queued request is deleted relative to the sink write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Delete on retrieval, before transform and write. A failure after
    /// retrieval loses the request.
    #[default]
    AtMostOnce,
    /// Delete only after the sink write succeeds. A failure leaves the
    /// request queued, so a restart processes it again.
    AtLeastOnce,
}

impl FromStr for Delivery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "at-most-once" => Ok(Self::AtMostOnce),
            "at-least-once" => Ok(Self::AtLeastOnce),
            other => Err(Error::Config(format!(
                "unknown delivery mode '{other}' (expected at-most-once or at-least-once)"
            ))),
        }
    }
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AtMostOnce => "at-most-once",
            Self::AtLeastOnce => "at-least-once",
        })
    }
}

/// Configuration for the consumer loop.
#[derive(Debug, Clone, Default)]
pub struct ConsumerConfig {
    pub backoff: Backoff,
    pub delivery: Delivery,
}

/// What happened to one request taken off the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A creation request, transformed and written to the sink.
    Stored(WidgetRecord),
    /// Any other kind. Nothing was written.
    Skipped {
        widget_id: Option<String>,
        kind: String,
    },
}

/// Counters reported when [`ConsumerLoop::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub stored: u64,
    pub skipped: u64,
    pub idle_polls: u64,
}

/// Drains the request queue into a sink until shut down.
///
/// Single consumer: running two loops against the same queue bucket can
/// process a request twice. Every error is fatal and ends the loop.
pub struct ConsumerLoop {
    queue: QueueSource,
    sink: Arc<dyn WidgetSink>,
    config: ConsumerConfig,
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
}

impl Clone for ConsumerLoop {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
            shutdown: Arc::clone(&self.shutdown),
            stopping: Arc::clone(&self.stopping),
        }
    }
}

impl ConsumerLoop {
    pub fn new(queue: QueueSource, sink: Arc<dyn WidgetSink>, config: ConsumerConfig) -> Self {
        Self {
            queue,
            sink,
            config,
            shutdown: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the loop to stop. Takes effect between requests, never during one.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    /// Wait for `signal`, then [`Self::shutdown`].
    ///
    /// If the listener fails, the error is logged and the loop keeps running.
    pub async fn shutdown_on<F>(&self, signal: F)
    where
        F: Future<Output = std::io::Result<()>>,
    {
        match signal.await {
            Ok(()) => {
                info!("interrupt received");
                self.shutdown();
            }
            Err(e) => error!(error = %e, "cannot listen for interrupt signal"),
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Run until [`Self::shutdown`] is called or an error occurs.
    pub async fn run(&self) -> Result<RunSummary> {
        info!(
            request_bucket = %self.queue.bucket(),
            sink = %self.sink.describe(),
            delivery = %self.config.delivery,
            "consumer started"
        );

        let mut summary = RunSummary::default();
        let mut idle_streak = 0u32;

        while !self.is_stopping() {
            let dispatch = match self.process_next().await {
                Ok(dispatch) => dispatch,
                Err(e) => {
                    error!(error = %e, "fatal error, consumer stopping");
                    return Err(e);
                }
            };

            match dispatch {
                Some(Dispatch::Stored(_)) => {
                    summary.stored += 1;
                    idle_streak = 0;
                }
                Some(Dispatch::Skipped { .. }) => {
                    summary.skipped += 1;
                    idle_streak = 0;
                }
                None => {
                    summary.idle_polls += 1;
                    let delay = self.config.backoff.delay(idle_streak);
                    idle_streak = idle_streak.saturating_add(1);
                    tokio::select! {
                        _ = self.shutdown.notified() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(
            stored = summary.stored,
            skipped = summary.skipped,
            "consumer shutting down"
        );
        Ok(summary)
    }

    /// Process requests until the queue is empty, then return what was done.
    pub async fn drain(&self) -> Result<Vec<Dispatch>> {
        let mut done = Vec::new();
        while let Some(dispatch) = self.process_next().await? {
            done.push(dispatch);
        }
        Ok(done)
    }

    /// Take one request off the queue and dispatch it.
    ///
    /// Returns `None` when the queue is empty.
    pub async fn process_next(&self) -> Result<Option<Dispatch>> {
        match self.config.delivery {
            Delivery::AtMostOnce => match self.queue.take_next().await? {
                Some(request) => self.dispatch(request).await.map(Some),
                None => Ok(None),
            },
            Delivery::AtLeastOnce => match self.queue.claim_next().await? {
                Some(claim) => {
                    let dispatch = self.dispatch(claim.request.clone()).await?;
                    self.queue.acknowledge(&claim).await?;
                    Ok(Some(dispatch))
                }
                None => Ok(None),
            },
        }
    }

    async fn dispatch(&self, request: RawRequest) -> Result<Dispatch> {
        let widget_id = request.widget_id();
        let span = start_dispatch_span(&request.kind, widget_id.as_deref());
        metrics::requests_consumed().add(1, &[KeyValue::new("kind", request.kind.clone())]);

        if !request.is_create() {
            info!(
                parent: &span,
                widget_id = widget_id.as_deref().unwrap_or("-"),
                kind = %request.kind,
                "skipping non-create request"
            );
            metrics::requests_skipped().add(1, &[KeyValue::new("kind", request.kind.clone())]);
            record_outcome(&span, "skipped");
            return Ok(Dispatch::Skipped {
                widget_id,
                kind: request.kind,
            });
        }

        let record = span.in_scope(|| transform(request))?;
        let sink = self.sink.describe();

        let started = Instant::now();
        self.sink.put(&record).instrument(span.clone()).await?;
        metrics::sink_put_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("sink", sink.clone())],
        );
        metrics::records_stored().add(1, &[KeyValue::new("sink", sink)]);
        record_outcome(&span, "stored");

        Ok(Dispatch::Stored(record))
    }
}
