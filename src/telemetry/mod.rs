//! Logging and OpenTelemetry initialization.
//!
//! Sets up tracing-subscriber once at process start. Log lines go to
//! stderr and, optionally, to an append-only log file. If an OTLP endpoint
//! is configured, traces, metrics, and logs are exported there as well.
//!
//! Library code only emits `tracing` events; it never installs a
//! subscriber, so tests can capture output with a scoped one.

pub mod metrics;
pub mod request;

use crate::error::{Error, Result};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

/// Configuration for telemetry initialization.
pub struct TelemetryConfig {
    /// OTLP collector, e.g. "http://localhost:4317". `None` keeps output local.
    pub endpoint: Option<String>,
    /// The service name reported in telemetry signals.
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset (e.g. "info").
    pub default_level: String,
    /// Append log lines to this file in addition to stderr.
    pub log_file: Option<PathBuf>,
}

/// OTLP pipelines for one process, all pointed at the same collector.
struct OtlpProviders {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
    logger: SdkLoggerProvider,
}

impl OtlpProviders {
    fn connect(endpoint: &str, service_name: &str) -> Result<Self> {
        use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig as _};

        let failed = |signal: &str, e: opentelemetry_otlp::ExporterBuildError| {
            Error::Other(format!("failed to create OTLP {signal} exporter: {e}"))
        };
        let resource = Resource::builder()
            .with_service_name(service_name.to_string())
            .build();

        let spans = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| failed("span", e))?;
        let metrics = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| failed("metric", e))?;
        let logs = LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| failed("log", e))?;

        let meter = SdkMeterProvider::builder()
            .with_periodic_exporter(metrics)
            .with_resource(resource.clone())
            .build();
        // Instruments in `metrics` are created from the global provider.
        opentelemetry::global::set_meter_provider(meter.clone());

        Ok(Self {
            tracer: SdkTracerProvider::builder()
                .with_batch_exporter(spans)
                .with_resource(resource.clone())
                .build(),
            meter,
            logger: SdkLoggerProvider::builder()
                .with_batch_exporter(logs)
                .with_resource(resource)
                .build(),
        })
    }
}

/// Flushes and shuts down the OTLP pipelines on drop. Hold it until exit.
pub struct TelemetryGuard {
    otlp: Option<OtlpProviders>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(otlp) = self.otlp.take() {
            let _ = otlp.logger.shutdown();
            let _ = otlp.meter.shutdown();
            let _ = otlp.tracer.shutdown();
        }
    }
}

/// Install the global subscriber: stderr, the optional log file, and the
/// OTLP trace and log bridges when an endpoint is set.
///
/// # Errors
///
/// Fails if the log file cannot be opened, an OTLP exporter cannot be
/// built, or a global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard> {
    use opentelemetry::trace::TracerProvider as _;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let otlp = config
        .endpoint
        .as_deref()
        .map(|endpoint| OtlpProviders::connect(endpoint, &config.service_name))
        .transpose()?;
    let trace_layer = otlp.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer.tracer("widget-consumer"))
    });
    let log_layer = otlp
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logger));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(trace_layer)
        .with(log_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))?;

    Ok(TelemetryGuard { otlp })
}
