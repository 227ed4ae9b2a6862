//! Core data models for the dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DashboardError, Result};

/// Default page size for the history view
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default cost of a single breakdown, in currency units
pub const DEFAULT_BREAKDOWN_COST: f64 = 50_000.0;

/// Default number of failures per month
pub const DEFAULT_FAILURES_PER_MONTH: f64 = 3.0;

/// Ordinal risk classification assigned to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[serde(alias = "low", alias = "Low")]
    Low,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "high", alias = "High")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// Sort order of the history view, over the timestamp field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// History filters. `None` (or a blank machine id) means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl FilterState {
    pub fn machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    pub fn risk_level(mut self, risk: RiskLevel) -> Self {
        self.risk_level = Some(risk);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Build filters from raw text inputs; blank inputs are unset.
    pub fn from_inputs(machine: &str, risk: &str, date: &str) -> std::result::Result<Self, String> {
        let machine = Some(machine.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let risk_level = match risk.trim() {
            "" => None,
            r => Some(r.parse()?),
        };
        let date = match date.trim() {
            "" => None,
            d => Some(
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|e| format!("invalid date '{}': {}", d, e))?,
            ),
        };
        Ok(Self {
            machine,
            risk_level,
            date,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.machine.as_deref().map_or(true, |m| m.trim().is_empty())
            && self.risk_level.is_none()
            && self.date.is_none()
    }
}

/// Pagination state of the history view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageState {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageState {
    /// First page with the given size (clamped to at least 1)
    pub fn first(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// Raw operator input, exactly as typed into the parameter form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionForm {
    pub machine_id: String,
    pub air_temp: String,
    pub process_temp: String,
    pub rpm: String,
    pub torque: String,
    pub breakdown_cost: String,
    pub failures_per_month: String,
}

/// Validated prediction request body for `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    pub air_temp: f64,
    pub process_temp: f64,
    pub rpm: f64,
    pub torque: f64,
    pub breakdown_cost: f64,
    pub failures_per_month: f64,
}

/// Prediction response as it arrives on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_savings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_risk_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_impact_value: Option<f64>,
    #[serde(default, alias = "explanation_factors", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalized, validated prediction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub health_score: f64,
    pub failure_probability: f64,
    pub risk_level: RiskLevel,
    pub monthly_savings: f64,
    pub confidence_score: f64,
    pub top_risk_factor: Option<String>,
    pub top_impact_value: Option<f64>,
    pub explanation_factors: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
}

impl PredictionResult {
    /// Check every numeric field is finite and every percentage lies in 0..=100.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("health_score", self.health_score),
            ("failure_probability", self.failure_probability),
            ("confidence_score", self.confidence_score),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(DashboardError::malformed(
                    "prediction",
                    format!("{} out of range: {}", name, value),
                ));
            }
        }
        if !self.monthly_savings.is_finite() {
            return Err(DashboardError::malformed(
                "prediction",
                "monthly_savings is not a finite number",
            ));
        }
        if let Some(impact) = self.top_impact_value {
            if !impact.is_finite() {
                return Err(DashboardError::malformed(
                    "prediction",
                    "top_impact_value is not a finite number",
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<PredictionResponse> for PredictionResult {
    type Error = DashboardError;

    fn try_from(raw: PredictionResponse) -> Result<Self> {
        fn required<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| DashboardError::malformed("prediction", format!("missing {}", name)))
        }

        let risk_level = required(raw.risk_level, "risk_level")?
            .parse::<RiskLevel>()
            .map_err(|e| DashboardError::malformed("prediction", e))?;

        let result = PredictionResult {
            health_score: required(raw.health_score, "health_score")?,
            failure_probability: required(raw.failure_probability, "failure_probability")?,
            risk_level,
            monthly_savings: required(raw.monthly_savings, "monthly_savings")?,
            confidence_score: required(raw.confidence_score, "confidence_score")?,
            top_risk_factor: raw.top_risk_factor.filter(|f| !f.trim().is_empty()),
            top_impact_value: raw.top_impact_value,
            explanation_factors: raw.explanation.unwrap_or_default(),
            recommendations: raw.recommendations.unwrap_or_default(),
        };
        result.validate()?;
        Ok(result)
    }
}

/// What the prediction service said about a request
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionReply {
    Accepted(PredictionResponse),
    Rejected(String),
}

impl From<PredictionResponse> for PredictionReply {
    fn from(response: PredictionResponse) -> Self {
        match response.error {
            Some(error) => PredictionReply::Rejected(error),
            None => PredictionReply::Accepted(response),
        }
    }
}

/// A single past prediction as listed by the history service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub machine_id: String,
    pub health_score: f64,
    pub failure_probability: f64,
    pub risk_level: RiskLevel,
    pub monthly_savings: f64,
    pub timestamp: String,
}

/// One page of history, ordered as requested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
}

impl HistoryPage {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
