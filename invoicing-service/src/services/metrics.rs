//! Prometheus metrics for invoicing-service.
//!
//! Domain counters live in the default `prometheus` registry. HTTP request
//! metrics are recorded by the shared middleware through the `metrics` facade
//! and exported by the installed Prometheus recorder; `/metrics` renders both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

static HTTP_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Invoice operations by kind (create, update, delete).
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoices_total",
        "Total number of invoice operations",
        &["operation"]
    )
    .expect("Failed to register invoices_total")
});

/// Invoice product operations by kind (add, update, delete).
pub static INVOICE_PRODUCTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoice_products_total",
        "Total number of invoice product operations",
        &["operation"]
    )
    .expect("Failed to register invoice_products_total")
});

/// Spreadsheet exports by outcome.
pub static EXPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_exports_total",
        "Total number of invoice spreadsheet exports",
        &["status"]
    )
    .expect("Failed to register exports_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoicing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics and install the HTTP metrics recorder.
///
/// Safe to call more than once; only the first call installs the recorder.
pub fn init_metrics() {
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&INVOICE_PRODUCTS_TOTAL);
    Lazy::force(&EXPORTS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);

    if HTTP_METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = HTTP_METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!("HTTP metrics recorder not installed: {}", e),
        }
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut body = encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default();

    if let Some(handle) = HTTP_METRICS_HANDLE.get() {
        body.push_str(&handle.render());
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_metrics_include_domain_counters() {
        init_metrics();
        INVOICES_TOTAL.with_label_values(&["create"]).inc();
        assert!(get_metrics().contains("invoicing_invoices_total"));
    }
}
