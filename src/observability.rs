use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: create/update requests run through hooks. Labels: trigger, outcome.
pub const REQUESTS_TOTAL: &str = "talkguard_requests_total";

/// Histogram: time spent in before-write hooks, in seconds. Labels: trigger.
pub const VALIDATION_DURATION_SECONDS: &str = "talkguard_validation_duration_seconds";

// ── Scan size ───────────────────────────────────────────────────

/// Histogram: talks fetched from the room per overlap check.
pub const ROOM_CANDIDATES: &str = "talkguard_room_candidates";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
