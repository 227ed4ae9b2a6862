//! Report assembly from the current display state
//!
//! The assembler never fetches anything. It reads the snapshot the operator
//! is looking at, asks the chart renderer for both trend images, and strips
//! display units from the numeric slots before packaging.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::display::{ChartSeries, DisplaySnapshot, PLACEHOLDER};
use crate::error::{DashboardError, Result};

/// Body of `POST /download-report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub health_score: String,
    pub failure_probability: String,
    pub risk_level: String,
    pub confidence_score: String,
    pub monthly_savings: String,
    pub top_risk_factor: String,
    /// Encoded image of the health-score trend
    pub health_chart: String,
    /// Encoded image of the failure-probability trend
    pub probability_chart: String,
}

/// Turns a chart series into an opaque encoded image
pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &ChartSeries) -> Result<String>;
}

/// Renders a line chart as SVG and returns it as a base64 `data:` URI
#[derive(Debug, Clone, Copy)]
pub struct SvgChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 640,
            height: 240,
        }
    }
}

impl SvgChartRenderer {
    const PADDING: f64 = 24.0;

    pub fn svg(&self, series: &ChartSeries) -> String {
        let w = self.width as f64;
        let h = self.height as f64;
        let plot_w = w - 2.0 * Self::PADDING;
        let plot_h = h - 2.0 * Self::PADDING;
        let steps = series.len().saturating_sub(1).max(1) as f64;

        let mut points = String::new();
        for (i, value) in series.values.iter().enumerate() {
            let x = Self::PADDING + plot_w * i as f64 / steps;
            let y = Self::PADDING + plot_h * (1.0 - value.clamp(0.0, 100.0) / 100.0);
            if i > 0 {
                points.push(' ');
            }
            let _ = write!(points, "{:.1},{:.1}", x, y);
        }

        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<title>{title}</title>"#,
                r#"<rect width="{w}" height="{h}" fill="white"/>"#,
                r#"<polyline fill="none" stroke="steelblue" stroke-width="2" points="{points}"/>"#,
                "</svg>"
            ),
            w = self.width,
            h = self.height,
            title = escape_xml(&series.title),
            points = points,
        )
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, series: &ChartSeries) -> Result<String> {
        if series.is_empty() {
            return Err(DashboardError::ReportNotReady(format!(
                "{} chart has no data",
                series.title
            )));
        }
        Ok(format!(
            "data:image/svg+xml;base64,{}",
            BASE64.encode(self.svg(series))
        ))
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Packages the current display state for the report service
pub struct ReportAssembler<'a> {
    renderer: &'a dyn ChartRenderer,
    currency_symbol: String,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(renderer: &'a dyn ChartRenderer, currency_symbol: impl Into<String>) -> Self {
        Self {
            renderer,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Fails with `ReportNotReady` while either chart is still empty.
    pub fn assemble(&self, snapshot: &DisplaySnapshot) -> Result<ReportRequest> {
        for chart in [&snapshot.health_chart, &snapshot.probability_chart] {
            if chart.is_empty() {
                return Err(DashboardError::ReportNotReady(format!(
                    "{} chart has not been rendered yet",
                    chart.title
                )));
            }
        }

        let health_chart = self.render(&snapshot.health_chart)?;
        let probability_chart = self.render(&snapshot.probability_chart)?;
        let metrics = &snapshot.metrics;

        Ok(ReportRequest {
            health_score: self.strip_units(&metrics.health_score),
            failure_probability: self.strip_units(&metrics.failure_probability),
            risk_level: metrics.risk_level.clone(),
            confidence_score: self.strip_units(&metrics.confidence_score),
            monthly_savings: self.strip_units(&metrics.monthly_savings),
            top_risk_factor: metrics.top_risk_factor.clone(),
            health_chart,
            probability_chart,
        })
    }

    fn render(&self, series: &ChartSeries) -> Result<String> {
        let image = self.renderer.render(series)?;
        if image.is_empty() {
            return Err(DashboardError::ReportNotReady(format!(
                "{} chart produced no image",
                series.title
            )));
        }
        Ok(image)
    }

    /// `82%` → `82`, `₹12,000` → `12000`; the placeholder passes through.
    pub fn strip_units(&self, text: &str) -> String {
        if text == PLACEHOLDER {
            return text.to_string();
        }
        text.replace(self.currency_symbol.as_str(), "")
            .chars()
            .filter(|c| *c != '%' && *c != ',' && !c.is_whitespace())
            .collect()
    }
}
