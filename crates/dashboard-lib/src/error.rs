//! Error taxonomy for the dashboard sync engine

use thiserror::Error;

/// Failures surfaced by the sync engine.
///
/// Every variant renders as a single human-readable message suitable for the
/// dashboard's status line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// A required form field was empty or not a number. No request was sent.
    #[error("{field} is required and must be a number{}", detail(.reason))]
    Validation { field: &'static str, reason: String },

    /// The prediction service answered with a domain-level `error`.
    #[error("Prediction rejected: {0}")]
    PredictionRejected(String),

    /// Network failure, non-success status or unreadable body.
    #[error("Could not reach the {service} service: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// Response arrived but is missing required fields or has values out of range.
    #[error("Malformed {what}: {reason}")]
    MalformedResponse { what: &'static str, reason: String },

    /// The response belongs to a request that has since been superseded.
    #[error("Response discarded: a newer request is outstanding")]
    StaleResponseDiscarded,

    /// Report assembly attempted before the charts have data.
    #[error("Report not ready: {0}")]
    ReportNotReady(String),
}

fn detail(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(" ({})", reason)
    }
}

impl DashboardError {
    pub fn transport(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }

    pub fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            what,
            reason: reason.into(),
        }
    }

    /// Message shown to the operator.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Silent outcomes are expected and never shown to the operator.
    pub fn is_silent(&self) -> bool {
        matches!(self, DashboardError::StaleResponseDiscarded)
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Validation { .. } => "validation",
            DashboardError::PredictionRejected(_) => "prediction_rejected",
            DashboardError::Transport { .. } => "transport",
            DashboardError::MalformedResponse { .. } => "malformed_response",
            DashboardError::StaleResponseDiscarded => "stale_response",
            DashboardError::ReportNotReady(_) => "report_not_ready",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
