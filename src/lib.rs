//! # widget-consumer
//!
//! Drains widget requests from an S3 bucket used as a queue, flattens each
//! creation request into a canonical record, and stores it in DynamoDB or
//! another S3 bucket.
//!
//! Provides the queue reader, the request transformer, both sinks, the
//! consumer loop, and tracing/OpenTelemetry setup.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod queue;
pub mod sink;
pub mod storage;
pub mod telemetry;
pub mod transform;
