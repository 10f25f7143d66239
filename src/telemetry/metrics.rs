//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

/// Ticks received, by source.
pub static TICKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "linewatch_ticks_total",
        "Re-examination ticks received",
        &["origin"]
    )
    .unwrap()
});

/// Ticks dropped by the debounce gate.
pub static TICKS_SUPPRESSED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "linewatch_ticks_suppressed_total",
        "Ticks dropped inside the debounce window"
    )
    .unwrap()
});

/// Read attempts that were retried.
pub static READ_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("linewatch_read_retries_total", "Retried file reads").unwrap()
});

/// Reads that gave up, by kind.
pub static READ_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "linewatch_read_failures_total",
        "File reads that failed",
        &["kind"]
    )
    .unwrap()
});

/// Reported line changes, by kind.
pub static LINE_CHANGES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "linewatch_line_changes_total",
        "Line-level changes reported",
        &["kind"]
    )
    .unwrap()
});

/// File created/deleted notices.
pub static FILE_NOTICES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "linewatch_file_notices_total",
        "File lifecycle notices reported",
        &["notice"]
    )
    .unwrap()
});

/// Snapshots dropped by eviction.
pub static SNAPSHOTS_EVICTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "linewatch_snapshots_evicted_total",
        "Snapshots dropped by eviction"
    )
    .unwrap()
});

/// Snapshots currently held.
pub static SNAPSHOTS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("linewatch_snapshots", "Snapshots currently stored").unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*TICKS_TOTAL;
    let _ = &*TICKS_SUPPRESSED;
    let _ = &*READ_RETRIES;
    let _ = &*READ_FAILURES;
    let _ = &*LINE_CHANGES;
    let _ = &*FILE_NOTICES;
    let _ = &*SNAPSHOTS_EVICTED;
    let _ = &*SNAPSHOTS_STORED;

    tracing::debug!("Prometheus metrics initialized");
}

/// Render every registered metric in the text exposition format.
#[must_use]
pub fn render_metrics() -> String {
    TextEncoder::new()
        .encode_to_string(&prometheus::gather())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to encode metrics");
            String::new()
        })
}
