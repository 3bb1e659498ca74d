// Metrics for observability
// HTTP counters and histograms recorded by the middleware, backend and CAS
// counters recorded by the repositories

use std::time::Instant;

use anyhow::Context;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    // HTTP request metrics
    describe_counter!(
        "http_requests_total",
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Backend metrics
    describe_counter!(
        "kv_backend_ops_total",
        "Total number of key-value backend operations"
    );
    describe_counter!(
        "group_cas_retries_total",
        "Total number of group writes retried after a lost compare-and-set"
    );

    tracing::info!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method.to_string(), "path" => path.to_string()).record(duration_secs);

    if status >= 400 {
        counter!("http_requests_errors_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
    }
}

/// Timer helper for measuring request duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let elapsed = timer.elapsed_secs();
        assert!(elapsed >= 0.01);
        assert!(elapsed < 1.0);
    }

    #[test]
    fn test_record_http_request_rendered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/config/{id}", 404, 0.002);
            record_http_request("GET", "/config/{id}", 200, 0.001);
        });

        let rendered = handle.render();
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("http_requests_errors_total"));
        assert!(rendered.contains("status=\"404\""));
    }
}
