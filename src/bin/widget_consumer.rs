//! widget-consumer: drain widget requests from a queue bucket into a sink.

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use widget_consumer::config::{Cli, Config, SinkTarget};
use widget_consumer::engine::{ConsumerLoop, Dispatch};
use widget_consumer::queue::QueueSource;
use widget_consumer::sink::{BlobSink, TableSink, WidgetSink};
use widget_consumer::storage::dynamodb::DynamoTable;
use widget_consumer::storage::load_sdk_config;
use widget_consumer::storage::s3::S3BlobStore;
use widget_consumer::telemetry::{TelemetryConfig, init_telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "widget-consumer".to_string(),
        default_level: config.log_level.clone(),
        log_file: cli.log_file.clone(),
    })?;

    let target = cli.sink_target()?;

    let sdk_config = load_sdk_config(&config.aws).await;
    let blobs = Arc::new(S3BlobStore::new(&sdk_config, &config.aws));

    let sink: Arc<dyn WidgetSink> = match &target {
        SinkTarget::Table(name) => Arc::new(TableSink::new(
            Arc::new(DynamoTable::new(&sdk_config, &config.aws)),
            name.clone(),
        )),
        SinkTarget::Blob(name) => Arc::new(BlobSink::new(blobs.clone(), name.clone())),
    };

    let consumer = ConsumerLoop::new(
        QueueSource::new(blobs, cli.request_bucket.clone()),
        sink,
        cli.consumer_config(),
    );

    if cli.drain {
        let done = consumer.drain().await?;
        let stored = done
            .iter()
            .filter(|d| matches!(d, Dispatch::Stored(_)))
            .count();
        info!(
            stored,
            skipped = done.len() - stored,
            "queue drained"
        );
        return Ok(());
    }

    let ctrl = consumer.clone();
    tokio::spawn(async move { ctrl.shutdown_on(tokio::signal::ctrl_c()).await });

    consumer.run().await?;
    Ok(())
}
