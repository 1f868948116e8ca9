use std::net::SocketAddr;

use crate::session::Trigger;

// ── Ingestion ───────────────────────────────────────────────────

/// Counter: ingestion cycles started.
pub const INGEST_CYCLES_TOTAL: &str = "occugrid_ingest_cycles_total";

/// Counter: strategy attempts. Labels: strategy, outcome
/// (success, transport, parse, validation).
pub const STRATEGY_ATTEMPTS_TOTAL: &str = "occugrid_strategy_attempts_total";

/// Histogram: completed ingestion cycle duration in seconds.
pub const INGEST_DURATION_SECONDS: &str = "occugrid_ingest_duration_seconds";

/// Gauge: records in the most recent completed cycle.
pub const RECORDS_LOADED: &str = "occugrid_records_loaded";

// ── Session ─────────────────────────────────────────────────────

/// Counter: cycles triggered from the session. Labels: trigger.
pub const SESSION_TRIGGERS_TOTAL: &str = "occugrid_session_triggers_total";

/// Counter: cycles whose result was discarded because a newer one started.
pub const CYCLES_SUPERSEDED_TOTAL: &str = "occugrid_cycles_superseded_total";

/// Gauge: 1 while the session is showing fallback data, 0 for live data.
pub const FALLBACK_ACTIVE: &str = "occugrid_fallback_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a session trigger to a short label for metrics.
pub fn trigger_label(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::Open => "open",
        Trigger::Previous => "previous",
        Trigger::Next => "next",
        Trigger::Reload => "reload",
        Trigger::Jump => "jump",
    }
}
