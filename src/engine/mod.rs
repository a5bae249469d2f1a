//! Consumer engine: queue polling, dispatch, idle backoff, shutdown.

pub mod backoff;
pub mod consumer;

pub use backoff::Backoff;
pub use consumer::{ConsumerConfig, ConsumerLoop, Delivery, Dispatch, RunSummary};
