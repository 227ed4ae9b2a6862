//! Display synchronization
//!
//! `DisplaySynchronizer` owns the only `DisplaySnapshot`. Other components
//! hand it candidate updates; it decides whether they apply.
//!
//! History pages follow "last request wins": each refresh takes a ticket
//! before its fetch starts, and only the newest ticket may update the table
//! and the trend charts.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::models::{HistoryPage, HistoryRecord, PredictionResult, RiskLevel, SortOrder};
use crate::query::QueryDescriptor;

/// Sentinel shown in empty metric slots
pub const PLACEHOLDER: &str = "--";

/// Colour coding of the risk level slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Yellow,
    Red,
    Neutral,
}

impl From<RiskLevel> for RiskColor {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => RiskColor::Green,
            RiskLevel::Medium => RiskColor::Yellow,
            RiskLevel::High => RiskColor::Red,
        }
    }
}

/// Rendered values of the live metrics panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsPanel {
    pub health_score: String,
    pub failure_probability: String,
    pub risk_level: String,
    pub risk_color: RiskColor,
    pub confidence_score: String,
    pub monthly_savings: String,
    pub top_risk_factor: String,
    pub top_impact: String,
    pub explanations: Vec<String>,
    pub recommendations: Vec<String>,
}

impl MetricsPanel {
    pub fn placeholder(currency_symbol: &str) -> Self {
        Self {
            health_score: PLACEHOLDER.to_string(),
            failure_probability: PLACEHOLDER.to_string(),
            risk_level: PLACEHOLDER.to_string(),
            risk_color: RiskColor::Neutral,
            confidence_score: PLACEHOLDER.to_string(),
            monthly_savings: format_currency(0.0, currency_symbol),
            top_risk_factor: PLACEHOLDER.to_string(),
            top_impact: PLACEHOLDER.to_string(),
            explanations: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn from_result(result: &PredictionResult, currency_symbol: &str) -> Self {
        Self {
            health_score: format_percent(result.health_score),
            failure_probability: format_percent(result.failure_probability),
            risk_level: result.risk_level.to_string(),
            risk_color: result.risk_level.into(),
            confidence_score: format_percent(result.confidence_score),
            monthly_savings: format_currency(result.monthly_savings, currency_symbol),
            top_risk_factor: result
                .top_risk_factor
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            top_impact: result
                .top_impact_value
                .map(|v| format!("{:+.2}", v))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            explanations: format_explanations(&result.explanation_factors),
            recommendations: result.recommendations.clone(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.health_score == PLACEHOLDER && self.risk_color == RiskColor::Neutral
    }
}

/// One trend chart: x labels (timestamps) and y values, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn empty(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Everything currently on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub metrics: MetricsPanel,
    pub history: Vec<HistoryRecord>,
    pub health_chart: ChartSeries,
    pub probability_chart: ChartSeries,
    /// Query whose page is currently displayed
    #[serde(skip)]
    pub history_query: Option<QueryDescriptor>,
}

impl DisplaySnapshot {
    fn new(currency_symbol: &str) -> Self {
        Self {
            metrics: MetricsPanel::placeholder(currency_symbol),
            history: Vec::new(),
            health_chart: ChartSeries::empty("Health Score"),
            probability_chart: ChartSeries::empty("Failure Probability"),
            history_query: None,
        }
    }
}

/// Tag attached to an issued history refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTicket {
    seq: u64,
    query: QueryDescriptor,
}

impl HistoryTicket {
    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

pub struct DisplaySynchronizer {
    snapshot: DisplaySnapshot,
    currency_symbol: String,
    next_seq: u64,
    latest: Option<HistoryTicket>,
}

impl DisplaySynchronizer {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        let currency_symbol = currency_symbol.into();
        Self {
            snapshot: DisplaySnapshot::new(&currency_symbol),
            currency_symbol,
            next_seq: 0,
            latest: None,
        }
    }

    pub fn snapshot(&self) -> &DisplaySnapshot {
        &self.snapshot
    }

    /// Record that a refresh for `query` is being issued. Supersedes every earlier ticket.
    pub fn begin_history_request(&mut self, query: QueryDescriptor) -> HistoryTicket {
        self.next_seq += 1;
        let ticket = HistoryTicket {
            seq: self.next_seq,
            query,
        };
        self.latest = Some(ticket.clone());
        ticket
    }

    /// Whether `ticket` is the most recently issued refresh
    pub fn is_current(&self, ticket: &HistoryTicket) -> bool {
        self.latest.as_ref() == Some(ticket)
    }

    /// Swap in a new metrics panel, or keep the old one untouched if `result` is malformed.
    pub fn apply_prediction(&mut self, result: &PredictionResult) -> Result<()> {
        result.validate()?;
        self.snapshot.metrics = MetricsPanel::from_result(result, &self.currency_symbol);
        Ok(())
    }

    /// Apply a history page if it answers the latest request; otherwise discard it.
    pub fn apply_history_page(&mut self, page: HistoryPage, origin: &HistoryTicket) -> Result<()> {
        if !self.is_current(origin) {
            debug!(
                seq = origin.seq,
                query = %origin.query,
                "Discarding stale history page"
            );
            return Err(DashboardError::StaleResponseDiscarded);
        }

        let (health_chart, probability_chart) = chart_series(&page.records, origin.query.sort());
        self.snapshot.history = page.records;
        self.snapshot.health_chart = health_chart;
        self.snapshot.probability_chart = probability_chart;
        self.snapshot.history_query = Some(origin.query.clone());
        Ok(())
    }

    /// Put sentinel values in the metrics panel. Charts and history are untouched.
    pub fn reset_to_placeholder(&mut self) {
        self.snapshot.metrics = MetricsPanel::placeholder(&self.currency_symbol);
    }
}

/// Build both trend series oldest-to-newest, whatever order the table uses.
fn chart_series(records: &[HistoryRecord], sort: SortOrder) -> (ChartSeries, ChartSeries) {
    let mut health = ChartSeries::empty("Health Score");
    let mut probability = ChartSeries::empty("Failure Probability");

    let ordered: Box<dyn Iterator<Item = &HistoryRecord>> = match sort {
        SortOrder::Asc => Box::new(records.iter()),
        SortOrder::Desc => Box::new(records.iter().rev()),
    };
    for record in ordered {
        health.labels.push(record.timestamp.clone());
        health.values.push(record.health_score);
        probability.labels.push(record.timestamp.clone());
        probability.values.push(record.failure_probability);
    }
    (health, probability)
}

/// `82` → `82%`, `18.26` → `18.3%`
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

/// `12000` → `₹12,000` (rounded to whole units)
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, symbol, grouped)
}

/// Feature contributions, largest magnitude first
fn format_explanations(factors: &BTreeMap<String, f64>) -> Vec<String> {
    let mut entries: Vec<(&String, &f64)> = factors.iter().collect();
    entries.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    entries
        .into_iter()
        .map(|(feature, contribution)| format!("{}: {:+.2}", feature, contribution))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterState, PageState};
    use crate::query;

    fn result() -> PredictionResult {
        PredictionResult {
            health_score: 82.0,
            failure_probability: 18.0,
            risk_level: RiskLevel::Low,
            monthly_savings: 12000.0,
            confidence_score: 91.0,
            top_risk_factor: Some("Torque".to_string()),
            top_impact_value: Some(0.31),
            explanation_factors: BTreeMap::from([
                ("Air temperature".to_string(), 0.05),
                ("Torque".to_string(), 0.31),
                ("Rotational speed".to_string(), -0.12),
            ]),
            recommendations: vec!["Inspect spindle bearings".to_string()],
        }
    }

    fn record(ts: &str, health: f64) -> HistoryRecord {
        HistoryRecord {
            machine_id: "M-1".to_string(),
            health_score: health,
            failure_probability: 100.0 - health,
            risk_level: RiskLevel::Low,
            monthly_savings: 1000.0,
            timestamp: ts.to_string(),
        }
    }

    fn query(sort: SortOrder, page: u32) -> QueryDescriptor {
        query::build(
            &FilterState::default(),
            sort,
            PageState {
                page_number: page,
                page_size: 10,
            },
        )
    }

    #[test]
    fn test_starts_with_placeholders() {
        let sync = DisplaySynchronizer::new("₹");
        let metrics = &sync.snapshot().metrics;
        assert!(metrics.is_placeholder());
        assert_eq!(metrics.monthly_savings, "₹0");
        assert!(sync.snapshot().health_chart.is_empty());
    }

    #[test]
    fn test_apply_prediction_formats_panel() {
        let mut sync = DisplaySynchronizer::new("₹");
        sync.apply_prediction(&result()).unwrap();

        let metrics = &sync.snapshot().metrics;
        assert_eq!(metrics.health_score, "82%");
        assert_eq!(metrics.failure_probability, "18%");
        assert_eq!(metrics.risk_level, "LOW");
        assert_eq!(metrics.risk_color, RiskColor::Green);
        assert_eq!(metrics.monthly_savings, "₹12,000");
        assert_eq!(metrics.confidence_score, "91%");
        assert_eq!(metrics.top_risk_factor, "Torque");
        assert_eq!(metrics.top_impact, "+0.31");
        assert_eq!(
            metrics.explanations,
            vec![
                "Torque: +0.31".to_string(),
                "Rotational speed: -0.12".to_string(),
                "Air temperature: +0.05".to_string(),
            ]
        );
        assert_eq!(metrics.recommendations.len(), 1);
    }

    #[test]
    fn test_malformed_prediction_keeps_prior_panel() {
        let mut sync = DisplaySynchronizer::new("₹");
        sync.apply_prediction(&result()).unwrap();
        let before = sync.snapshot().clone();

        let mut bad = result();
        bad.health_score = f64::NAN;
        bad.risk_level = RiskLevel::High;
        assert!(sync.apply_prediction(&bad).is_err());
        assert_eq!(sync.snapshot(), &before);
    }

    #[test]
    fn test_reset_leaves_charts_alone() {
        let mut sync = DisplaySynchronizer::new("₹");
        let ticket = sync.begin_history_request(query(SortOrder::Asc, 1));
        sync.apply_history_page(
            HistoryPage::new(vec![record("t1", 90.0), record("t2", 80.0)]),
            &ticket,
        )
        .unwrap();
        sync.apply_prediction(&result()).unwrap();
        let charts = (
            sync.snapshot().health_chart.clone(),
            sync.snapshot().probability_chart.clone(),
        );

        sync.reset_to_placeholder();

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.metrics, MetricsPanel::placeholder("₹"));
        assert_eq!(snapshot.metrics.health_score, "--");
        assert_eq!(snapshot.metrics.monthly_savings, "₹0");
        assert_eq!(snapshot.health_chart, charts.0);
        assert_eq!(snapshot.probability_chart, charts.1);
        assert_eq!(snapshot.history.len(), 2);
    }

    #[test]
    fn test_late_response_from_older_request_is_discarded() {
        let mut sync = DisplaySynchronizer::new("₹");
        let r1 = sync.begin_history_request(query(SortOrder::Desc, 1));
        let r2 = sync.begin_history_request(query(SortOrder::Desc, 2));

        sync.apply_history_page(HistoryPage::new(vec![record("page2", 50.0)]), &r2)
            .unwrap();
        let err = sync
            .apply_history_page(HistoryPage::new(vec![record("page1", 99.0)]), &r1)
            .unwrap_err();

        assert!(err.is_silent());
        assert_eq!(sync.snapshot().history[0].timestamp, "page2");
        assert_eq!(sync.snapshot().history_query.as_ref(), Some(r2.query()));
    }

    #[test]
    fn test_identical_queries_still_ordered_by_issue() {
        let mut sync = DisplaySynchronizer::new("₹");
        let r1 = sync.begin_history_request(query(SortOrder::Desc, 1));
        let r2 = sync.begin_history_request(query(SortOrder::Desc, 1));
        assert_eq!(r1.query(), r2.query());
        assert!(!sync.is_current(&r1));
        assert!(sync.is_current(&r2));
    }

    #[test]
    fn test_charts_are_chronological_for_descending_table() {
        let mut sync = DisplaySynchronizer::new("₹");
        let ticket = sync.begin_history_request(query(SortOrder::Desc, 1));
        sync.apply_history_page(
            HistoryPage::new(vec![
                record("2024-03-03", 70.0),
                record("2024-03-02", 80.0),
                record("2024-03-01", 90.0),
            ]),
            &ticket,
        )
        .unwrap();

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.history[0].timestamp, "2024-03-03");
        assert_eq!(
            snapshot.health_chart.labels,
            vec!["2024-03-01", "2024-03-02", "2024-03-03"]
        );
        assert_eq!(snapshot.health_chart.values, vec![90.0, 80.0, 70.0]);
        assert_eq!(snapshot.probability_chart.values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_charts_keep_ascending_order() {
        let mut sync = DisplaySynchronizer::new("₹");
        let ticket = sync.begin_history_request(query(SortOrder::Asc, 1));
        sync.apply_history_page(
            HistoryPage::new(vec![record("a", 1.0), record("b", 2.0)]),
            &ticket,
        )
        .unwrap();
        assert_eq!(sync.snapshot().health_chart.labels, vec!["a", "b"]);
    }

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(0.0, "₹"), "₹0");
        assert_eq!(format_currency(999.4, "₹"), "₹999");
        assert_eq!(format_currency(12000.0, "₹"), "₹12,000");
        assert_eq!(format_currency(1234567.0, "$"), "$1,234,567");
        assert_eq!(format_currency(-4500.0, "₹"), "-₹4,500");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(82.0), "82%");
        assert_eq!(format_percent(18.26), "18.3%");
        assert_eq!(format_percent(0.0), "0%");
    }
}
