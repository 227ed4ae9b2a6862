//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use dashboard_lib::display::format_currency;
use dashboard_lib::{ChartSeries, DisplaySnapshot, HistoryRecord, MetricsPanel, RiskColor};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the history table
#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Machine")]
    machine_id: String,
    #[tabled(rename = "Health")]
    health_score: String,
    #[tabled(rename = "Failure %")]
    failure_probability: String,
    #[tabled(rename = "Risk")]
    risk_level: String,
    #[tabled(rename = "Savings")]
    monthly_savings: String,
}

impl HistoryRow {
    fn new(record: &HistoryRecord, currency_symbol: &str) -> Self {
        Self {
            timestamp: format_timestamp(&record.timestamp),
            machine_id: record.machine_id.clone(),
            health_score: format!("{:.1}", record.health_score),
            failure_probability: format!("{:.1}", record.failure_probability),
            risk_level: color_risk(record.risk_level.as_str(), record.risk_level.into()),
            monthly_savings: format_currency(record.monthly_savings, currency_symbol),
        }
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the live metrics panel
pub fn print_metrics(panel: &MetricsPanel) {
    println!("{}", "Machine Health".bold());
    println!("{}", "=".repeat(50));
    println!("Health Score:           {}", panel.health_score);
    println!("Failure Probability:    {}", panel.failure_probability);
    println!(
        "Risk Level:             {}",
        color_risk(&panel.risk_level, panel.risk_color)
    );
    println!("Confidence:             {}", panel.confidence_score);
    println!(
        "Monthly Savings:        {}",
        panel.monthly_savings.green().bold()
    );
    println!(
        "Top Risk Factor:        {} ({})",
        panel.top_risk_factor.cyan(),
        panel.top_impact
    );

    if !panel.explanations.is_empty() {
        println!();
        println!("{}", "Explanation".bold());
        println!("{}", "-".repeat(50));
        for line in &panel.explanations {
            println!("  {}", line);
        }
    }

    if !panel.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".bold());
        println!("{}", "-".repeat(50));
        for line in &panel.recommendations {
            println!("  • {}", line);
        }
    }
}

/// Print the history table followed by both trend charts
pub fn print_history(snapshot: &DisplaySnapshot, currency_symbol: &str, page_number: u32) {
    println!("{} (page {})", "Prediction History".bold(), page_number);
    println!("{}", "=".repeat(60));

    if snapshot.history.is_empty() {
        println!("{}", "No records found".yellow());
        return;
    }

    let rows: Vec<HistoryRow> = snapshot
        .history
        .iter()
        .map(|r| HistoryRow::new(r, currency_symbol))
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());

    println!();
    print_chart(&snapshot.health_chart);
    print_chart(&snapshot.probability_chart);
}

/// Print a one-line sparkline for a trend chart, oldest value first
pub fn print_chart(series: &ChartSeries) {
    if series.is_empty() {
        return;
    }
    println!("{:<22} {}", format!("{}:", series.title), sparkline(&series.values).cyan());
}

/// Print whatever is on screen in the requested format
pub fn print_snapshot(
    snapshot: &DisplaySnapshot,
    currency_symbol: &str,
    page_number: u32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            print_metrics(&snapshot.metrics);
            println!();
            print_history(snapshot, currency_symbol, page_number);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Colour a risk label: LOW green, MEDIUM yellow, HIGH red
pub fn color_risk(label: &str, color: RiskColor) -> String {
    match color {
        RiskColor::Green => label.green().bold().to_string(),
        RiskColor::Yellow => label.yellow().bold().to_string(),
        RiskColor::Red => label.red().bold().to_string(),
        RiskColor::Neutral => label.dimmed().to_string(),
    }
}

/// Render 0-100 values as block characters
pub fn sparkline(values: &[f64]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    values
        .iter()
        .map(|v| {
            let idx = (v.clamp(0.0, 100.0) / 100.0 * (BLOCKS.len() - 1) as f64).round() as usize;
            BLOCKS[idx]
        })
        .collect()
}

/// Format timestamp for display
fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}
