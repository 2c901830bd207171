//! Prometheus metrics for garage-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter, TextEncoder,
};

/// Document operation counter by operation and outcome.
pub static DOCUMENT_OPERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "garage_document_operations_total",
        "Total number of document operations",
        &["operation", "outcome"]
    )
    .expect("Failed to register document_operations_total")
});

/// Documents written, by source type and status.
pub static DOCUMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "garage_documents_total",
        "Total number of documents written by source type and status",
        &["source_type", "status"] // invoicing|quotation, unpaid|paid|cancelled|voided
    )
    .expect("Failed to register documents_total")
});

/// Stock deduction attempts by outcome (deducted, skipped).
pub static STOCK_DEDUCTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "garage_stock_deductions_total",
        "Stock deduction attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to register stock_deductions_total")
});

/// Units taken out of stock.
pub static STOCK_UNITS_DEDUCTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "garage_stock_units_deducted_total",
        "Total part units deducted from stock"
    )
    .expect("Failed to register stock_units_deducted")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "garage_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Storage query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "garage_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DOCUMENT_OPERATIONS_TOTAL);
    Lazy::force(&DOCUMENTS_TOTAL);
    Lazy::force(&STOCK_DEDUCTIONS_TOTAL);
    Lazy::force(&STOCK_UNITS_DEDUCTED);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&service_core::middleware::metrics::HTTP_REQUESTS_TOTAL);
    Lazy::force(&service_core::middleware::metrics::HTTP_REQUEST_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
