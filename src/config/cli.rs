//! Command-line surface.
//!
//! Long flags only. Each has a short double-dash alias (`--rb`, `--dwt`,
//! `--wb`); the single-dash `-rb`/`-dwt`/`-wb` spellings are not accepted,
//! because clap reads `-rb` as the short flags `-r -b`.

use super::SinkTarget;
use crate::engine::{Backoff, ConsumerConfig, Delivery};
use crate::error::Result;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "widget-consumer",
    about = "Store widget creation requests from a queue bucket",
    group(ArgGroup::new("sink").required(true).args(["dynamodb_widget_table", "widget_bucket"]))
)]
pub struct Cli {
    /// Bucket holding pending requests
    #[arg(long, visible_alias = "rb", env = "REQUEST_BUCKET")]
    pub request_bucket: String,

    /// DynamoDB table to store widgets in
    #[arg(long, visible_alias = "dwt", env = "DYNAMODB_WIDGET_TABLE")]
    pub dynamodb_widget_table: Option<String>,

    /// Bucket to store widgets in, as JSON objects
    #[arg(long, visible_alias = "wb", env = "WIDGET_BUCKET")]
    pub widget_bucket: Option<String>,

    /// Pause after an empty poll, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_interval_ms: u64,

    /// Back off exponentially from the poll interval up to this many milliseconds
    #[arg(long)]
    pub max_backoff_ms: Option<u64>,

    /// When to delete a request: at-most-once or at-least-once
    #[arg(long, default_value_t = Delivery::AtMostOnce)]
    pub delivery: Delivery,

    /// Process whatever is queued, then exit instead of polling forever
    #[arg(long)]
    pub drain: bool,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn backoff(&self) -> Backoff {
        let interval = Duration::from_millis(self.poll_interval_ms);
        match self.max_backoff_ms {
            Some(max) => Backoff::Exponential {
                initial: interval,
                max: Duration::from_millis(max),
            },
            None => Backoff::Fixed(interval),
        }
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            backoff: self.backoff(),
            delivery: self.delivery,
        }
    }

    /// Resolve the sink flags. Rejects an empty name that clap let through.
    pub fn sink_target(&self) -> Result<SinkTarget> {
        SinkTarget::from_options(self.dynamodb_widget_table.clone(), self.widget_bucket.clone())
    }
}
