//! Observability for the dashboard session
//!
//! Provides:
//! - Prometheus metrics (submissions, rejections, transport errors, refreshes, stale discards, latency)
//! - Structured logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for service round trips (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

struct DashboardMetricsInner {
    predictions_submitted: IntCounter,
    predictions_succeeded: IntCounter,
    predictions_rejected: IntCounter,
    predictions_superseded: IntCounter,
    history_refreshes: IntCounter,
    stale_responses: IntCounter,
    transport_errors: IntCounterVec,
    request_latency_seconds: HistogramVec,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            predictions_submitted: register_int_counter!(
                "dashboard_predictions_submitted_total",
                "Prediction requests sent to the prediction service"
            )
            .expect("Failed to register predictions_submitted"),

            predictions_succeeded: register_int_counter!(
                "dashboard_predictions_succeeded_total",
                "Predictions applied to the metrics panel"
            )
            .expect("Failed to register predictions_succeeded"),

            predictions_rejected: register_int_counter!(
                "dashboard_predictions_rejected_total",
                "Predictions rejected by the service or as malformed"
            )
            .expect("Failed to register predictions_rejected"),

            predictions_superseded: register_int_counter!(
                "dashboard_predictions_superseded_total",
                "Pending predictions cancelled by a newer submission"
            )
            .expect("Failed to register predictions_superseded"),

            history_refreshes: register_int_counter!(
                "dashboard_history_refreshes_total",
                "History refreshes issued"
            )
            .expect("Failed to register history_refreshes"),

            stale_responses: register_int_counter!(
                "dashboard_stale_responses_discarded_total",
                "History pages discarded because a newer request was outstanding"
            )
            .expect("Failed to register stale_responses"),

            transport_errors: register_int_counter_vec!(
                "dashboard_transport_errors_total",
                "Network or parse failures by service",
                &["service"]
            )
            .expect("Failed to register transport_errors"),

            request_latency_seconds: register_histogram_vec!(
                "dashboard_request_latency_seconds",
                "Round-trip time of service calls",
                &["service"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register request_latency_seconds"),
        }
    }
}

/// Lightweight handle to the global dashboard metrics.
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new)
    }

    pub fn inc_predictions_submitted(&self) {
        self.inner().predictions_submitted.inc();
    }

    pub fn inc_predictions_succeeded(&self) {
        self.inner().predictions_succeeded.inc();
    }

    pub fn inc_predictions_rejected(&self) {
        self.inner().predictions_rejected.inc();
    }

    pub fn inc_predictions_superseded(&self) {
        self.inner().predictions_superseded.inc();
    }

    pub fn inc_history_refreshes(&self) {
        self.inner().history_refreshes.inc();
    }

    pub fn inc_stale_responses(&self) {
        self.inner().stale_responses.inc();
    }

    pub fn inc_transport_errors(&self, service: &str) {
        self.inner()
            .transport_errors
            .with_label_values(&[service])
            .inc();
    }

    pub fn observe_latency(&self, service: &str, duration_secs: f64) {
        self.inner()
            .request_latency_seconds
            .with_label_values(&[service])
            .observe(duration_secs);
    }

    pub fn stale_responses(&self) -> u64 {
        self.inner().stale_responses.get()
    }

    /// Render every registered metric in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for dashboard events
///
/// Stamps every event with the session id so interleaved sessions can be told apart.
#[derive(Clone)]
pub struct StructuredLogger {
    session_id: String,
}

impl StructuredLogger {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log_session_start(&self, api_url: &str, page_size: u32) {
        info!(
            event = "session_started",
            session = %self.session_id,
            api_url = %api_url,
            page_size = page_size,
            "Dashboard session started"
        );
    }

    pub fn log_prediction_submitted(&self, generation: u64, machine_id: Option<&str>) {
        info!(
            event = "prediction_submitted",
            session = %self.session_id,
            generation = generation,
            machine_id = machine_id.unwrap_or("-"),
            "Prediction request issued"
        );
    }

    pub fn log_prediction_applied(&self, generation: u64, risk_level: &str, health_score: f64) {
        info!(
            event = "prediction_applied",
            session = %self.session_id,
            generation = generation,
            risk_level = %risk_level,
            health_score = health_score,
            "Prediction applied to metrics panel"
        );
    }

    pub fn log_prediction_failed(&self, generation: u64, kind: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            session = %self.session_id,
            generation = generation,
            kind = %kind,
            message = %message,
            "Prediction failed, metrics panel reset"
        );
    }

    pub fn log_prediction_superseded(&self, generation: u64) {
        debug!(
            event = "prediction_superseded",
            session = %self.session_id,
            generation = generation,
            "Pending prediction cancelled by newer submission"
        );
    }

    pub fn log_history_requested(&self, seq: u64, query: &str) {
        debug!(
            event = "history_requested",
            session = %self.session_id,
            seq = seq,
            query = %query,
            "History refresh issued"
        );
    }

    pub fn log_history_applied(&self, seq: u64, query: &str, records: usize) {
        info!(
            event = "history_applied",
            session = %self.session_id,
            seq = seq,
            query = %query,
            records = records,
            "History page applied"
        );
    }

    pub fn log_history_stale(&self, seq: u64, query: &str) {
        debug!(
            event = "history_stale",
            session = %self.session_id,
            seq = seq,
            query = %query,
            "Stale history page discarded"
        );
    }

    pub fn log_history_failed(&self, seq: u64, query: &str, message: &str) {
        warn!(
            event = "history_failed",
            session = %self.session_id,
            seq = seq,
            query = %query,
            message = %message,
            "History refresh failed, keeping last known page"
        );
    }

    pub fn log_report(&self, bytes: usize) {
        info!(
            event = "report_downloaded",
            session = %self.session_id,
            bytes = bytes,
            "Report downloaded"
        );
    }

    pub fn log_export(&self, query: &str, bytes: usize) {
        info!(
            event = "history_exported",
            session = %self.session_id,
            query = %query,
            bytes = bytes,
            "History exported as CSV"
        );
    }
}
