//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Counter, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Access gate
    pub static ref GATE_DECISIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("visitas_gate_decisions_total", "Access gate decisions by outcome"),
        &["decision"]
    ).expect("metric can be created");
    pub static ref SESSION_REFRESH_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("visitas_session_refresh_total", "Session refresh attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Upstream services
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "visitas_upstream_request_duration_seconds",
            "Upstream request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service"]
    ).expect("metric can be created");

    // Visitas
    pub static ref VISITA_STATUS_UPDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("visitas_status_updates_total", "Visita status updates by target estado"),
        &["estado"]
    ).expect("metric can be created");
    pub static ref VISITAS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "visitas_created_total",
        "Total number of visitas created"
    ).expect("metric can be created");

    // Storage
    pub static ref UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("visitas_uploads_total", "Total number of uploads by kind"),
        &["tipo"]
    ).expect("metric can be created");
    pub static ref UPLOAD_BYTES_TOTAL: Counter = Counter::new(
        "visitas_upload_bytes_total",
        "Total bytes uploaded"
    ).expect("metric can be created");

    // Errors
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("visitas_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(GATE_DECISIONS_TOTAL.clone()))
            .expect("GATE_DECISIONS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(SESSION_REFRESH_TOTAL.clone()))
            .expect("SESSION_REFRESH_TOTAL can be registered");
        REGISTRY
            .register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()))
            .expect("UPSTREAM_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(VISITA_STATUS_UPDATES_TOTAL.clone()))
            .expect("VISITA_STATUS_UPDATES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(VISITAS_CREATED_TOTAL.clone()))
            .expect("VISITAS_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(UPLOADS_TOTAL.clone()))
            .expect("UPLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(UPLOAD_BYTES_TOTAL.clone()))
            .expect("UPLOAD_BYTES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
