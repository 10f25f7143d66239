//! Logging and metrics.

pub mod metrics;
mod observability;

pub use metrics::{init_metrics, render_metrics};
pub use observability::{init_tracing, spans, TracingConfig};
