use axum::extract::MatchedPath;
use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{CounterVec, HistogramVec, register_counter_vec, register_histogram_vec};
use std::time::Instant;

/// HTTP request counter by method, route template and status code.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by method and route template.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_request_duration_seconds")
});

/// Record request count and latency. Labels use the matched route template
/// (`/invoices/:id`), never the raw URI, to keep cardinality bounded.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), path.as_str()])
        .observe(start.elapsed().as_secs_f64());

    response
}
