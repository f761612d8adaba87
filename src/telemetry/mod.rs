//! Metrics collection for runtime monitoring.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
