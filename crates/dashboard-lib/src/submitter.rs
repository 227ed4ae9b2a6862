//! Parameter form validation and prediction submission

use std::sync::Arc;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::{
    PredictionForm, PredictionReply, PredictionRequest, PredictionResult, DEFAULT_BREAKDOWN_COST,
    DEFAULT_FAILURES_PER_MONTH,
};
use crate::service::PredictionService;

/// Fallbacks for the optional cost fields of the form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionDefaults {
    pub breakdown_cost: f64,
    pub failures_per_month: f64,
}

impl Default for SubmissionDefaults {
    fn default() -> Self {
        Self {
            breakdown_cost: DEFAULT_BREAKDOWN_COST,
            failures_per_month: DEFAULT_FAILURES_PER_MONTH,
        }
    }
}

impl From<&DashboardConfig> for SubmissionDefaults {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            breakdown_cost: config.default_breakdown_cost,
            failures_per_month: config.default_failures_per_month,
        }
    }
}

/// Turns raw form input into prediction results
#[derive(Clone)]
pub struct PredictionSubmitter {
    service: Arc<dyn PredictionService>,
    defaults: SubmissionDefaults,
}

impl PredictionSubmitter {
    pub fn new(service: Arc<dyn PredictionService>, defaults: SubmissionDefaults) -> Self {
        Self { service, defaults }
    }

    pub fn defaults(&self) -> SubmissionDefaults {
        self.defaults
    }

    /// Validate the form without touching the network.
    pub fn validate(&self, form: &PredictionForm) -> Result<PredictionRequest> {
        Ok(PredictionRequest {
            machine_id: Some(form.machine_id.trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            air_temp: required("air_temp", &form.air_temp)?,
            process_temp: required("process_temp", &form.process_temp)?,
            rpm: required("rpm", &form.rpm)?,
            torque: required("torque", &form.torque)?,
            breakdown_cost: optional(&form.breakdown_cost).unwrap_or(self.defaults.breakdown_cost),
            failures_per_month: optional(&form.failures_per_month)
                .unwrap_or(self.defaults.failures_per_month),
        })
    }

    /// Send an already validated request and normalize the reply.
    pub async fn send(&self, request: PredictionRequest) -> Result<PredictionResult> {
        debug!(machine_id = ?request.machine_id, "Submitting prediction request");
        match self.service.predict(&request).await? {
            PredictionReply::Accepted(raw) => PredictionResult::try_from(raw),
            PredictionReply::Rejected(reason) => Err(DashboardError::PredictionRejected(reason)),
        }
    }

    /// Validate then send.
    pub async fn submit(&self, form: &PredictionForm) -> Result<PredictionResult> {
        let request = self.validate(form)?;
        self.send(request).await
    }
}

fn required(field: &'static str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::Validation {
            field,
            reason: String::new(),
        });
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DashboardError::Validation {
            field,
            reason: format!("got '{}'", trimmed),
        }),
    }
}

fn optional(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PredictionResponse, RiskLevel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CannedPredictions {
        reply: Result<PredictionReply>,
        calls: AtomicUsize,
        last_request: Mutex<Option<PredictionRequest>>,
    }

    impl CannedPredictions {
        fn new(reply: Result<PredictionReply>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl PredictionService for CannedPredictions {
        async fn predict(&self, request: &PredictionRequest) -> Result<PredictionReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.reply.clone()
        }
    }

    fn form() -> PredictionForm {
        PredictionForm {
            machine_id: "M-1".to_string(),
            air_temp: "310".to_string(),
            process_temp: "320".to_string(),
            rpm: "1800".to_string(),
            torque: "50".to_string(),
            ..Default::default()
        }
    }

    fn accepted() -> PredictionReply {
        PredictionReply::Accepted(PredictionResponse {
            health_score: Some(82.0),
            failure_probability: Some(18.0),
            risk_level: Some("LOW".to_string()),
            monthly_savings: Some(12000.0),
            confidence_score: Some(91.0),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_empty_torque_never_reaches_network() {
        let service = CannedPredictions::new(Ok(accepted()));
        let submitter = PredictionSubmitter::new(service.clone(), SubmissionDefaults::default());

        let mut input = form();
        input.torque = "  ".to_string();
        let err = submitter.submit(&input).await.unwrap_err();

        assert_eq!(
            err,
            DashboardError::Validation {
                field: "torque",
                reason: String::new()
            }
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let submitter = PredictionSubmitter::new(
            CannedPredictions::new(Ok(accepted())),
            SubmissionDefaults::default(),
        );
        let cases: [(&str, fn(&mut PredictionForm)); 4] = [
            ("air_temp", |f| f.air_temp.clear()),
            ("process_temp", |f| f.process_temp.clear()),
            ("rpm", |f| f.rpm = "fast".to_string()),
            ("torque", |f| f.torque.clear()),
        ];
        for (field, mutate) in cases {
            let mut input = form();
            mutate(&mut input);
            match submitter.validate(&input) {
                Err(DashboardError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_optional_fields_fall_back_to_defaults() {
        let submitter = PredictionSubmitter::new(
            CannedPredictions::new(Ok(accepted())),
            SubmissionDefaults::default(),
        );
        let mut input = form();
        input.breakdown_cost = "lots".to_string();
        input.failures_per_month = String::new();

        let request = submitter.validate(&input).unwrap();
        assert_eq!(request.breakdown_cost, 50000.0);
        assert_eq!(request.failures_per_month, 3.0);

        input.breakdown_cost = "72000".to_string();
        input.failures_per_month = "1.5".to_string();
        let request = submitter.validate(&input).unwrap();
        assert_eq!(request.breakdown_cost, 72000.0);
        assert_eq!(request.failures_per_month, 1.5);
    }

    #[tokio::test]
    async fn test_successful_submission_is_normalized() {
        let service = CannedPredictions::new(Ok(accepted()));
        let submitter = PredictionSubmitter::new(service.clone(), SubmissionDefaults::default());

        let result = submitter.submit(&form()).await.unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.confidence_score, 91.0);

        let sent = service.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.machine_id.as_deref(), Some("M-1"));
        assert_eq!(sent.rpm, 1800.0);
    }

    #[tokio::test]
    async fn test_service_error_field_is_rejection() {
        let service = CannedPredictions::new(Ok(PredictionReply::Rejected(
            "Model not loaded".to_string(),
        )));
        let submitter = PredictionSubmitter::new(service, SubmissionDefaults::default());

        let err = submitter.submit(&form()).await.unwrap_err();
        assert_eq!(
            err,
            DashboardError::PredictionRejected("Model not loaded".to_string())
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_passed_through_once() {
        let service = CannedPredictions::new(Err(DashboardError::transport(
            "prediction",
            "connection refused",
        )));
        let submitter = PredictionSubmitter::new(service.clone(), SubmissionDefaults::default());

        let err = submitter.submit(&form()).await.unwrap_err();
        assert!(matches!(err, DashboardError::Transport { .. }));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }
}
