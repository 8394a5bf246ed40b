//! Metrics collection.
//!
//! # Metrics
//! - `manifest_node_loads_total` (counter): successful module loads by module
//! - `manifest_node_load_failures_total` (counter): failed module loads by module
//! - `manifest_route_matches_total` (counter): matched navigations by route
//! - `manifest_route_misses_total` (counter): navigations matching no route
//! - `manifest_reloads_total` (counter): manifest swaps by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; the host application
//!   installs the recorder/exporter of its choice
//! - Without a recorder every call is a no-op

pub fn record_node_load(module: &str) {
    metrics::counter!("manifest_node_loads_total", "module" => module.to_string()).increment(1);
}

pub fn record_node_load_failure(module: &str) {
    metrics::counter!("manifest_node_load_failures_total", "module" => module.to_string())
        .increment(1);
}

pub fn record_route_match(route: &str) {
    metrics::counter!("manifest_route_matches_total", "route" => route.to_string()).increment(1);
}

pub fn record_route_miss() {
    metrics::counter!("manifest_route_misses_total").increment(1);
}

pub fn record_manifest_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("manifest_reloads_total", "outcome" => outcome).increment(1);
}
