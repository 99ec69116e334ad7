//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets for tree reads served from a warm pool
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!("admin9_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "admin9_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "admin9_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Permission engine metrics
    describe_counter!(
        "admin9_menu_tree_resolutions_total",
        "Menu trees resolved, by viewer kind (platform/tenant/role/user)"
    );
    describe_counter!(
        "admin9_scope_updates_total",
        "Tenant scope and role grant replacements by outcome (success/rejected/error)"
    );

    gauge!("admin9_http_requests_in_flight").set(0.0);
    for viewer in ["platform", "tenant", "role", "user"] {
        counter!("admin9_menu_tree_resolutions_total", "viewer" => viewer).absolute(0);
    }
    for target in ["tenant", "role"] {
        counter!("admin9_scope_updates_total", "target" => target, "outcome" => "success")
            .absolute(0);
    }
}
