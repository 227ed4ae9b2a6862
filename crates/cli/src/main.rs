//! Predictive Maintenance Dashboard CLI
//!
//! A command-line front end for the dashboard sync engine: run predictions,
//! browse and export the prediction history, and download maintenance reports.

mod commands;
mod config;
mod output;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use commands::{export, history, predict, report, session};
use dashboard_lib::{
    ApiClient, Dashboard, FilterState, PredictionForm, Services, SortOrder, StructuredLogger,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Predictive Maintenance Dashboard CLI
#[derive(Parser)]
#[command(name = "pmd")]
#[command(author, version, about = "CLI for the Predictive Maintenance Dashboard", long_about = None)]
pub struct Cli {
    /// Backend URL (can also be set via PMD_API_URL env var)
    #[arg(long, env = "PMD_API_URL")]
    pub api_url: Option<String>,

    /// Path to a config file (defaults to ~/.config/pmd/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a failure prediction for one machine
    Predict(PredictArgs),

    /// Show a page of prediction history
    History {
        #[command(flatten)]
        view: ViewArgs,

        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Export the filtered history as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Output file path
        #[arg(long, short, default_value = "prediction_history.csv")]
        output: PathBuf,
    },

    /// Download a maintenance report for the current readings and history
    Report {
        #[command(flatten)]
        prediction: PredictArgs,

        /// Output file path
        #[arg(long, short, default_value = "maintenance_report.pdf")]
        output: PathBuf,
    },

    /// Start an interactive dashboard session
    Session,
}

/// Sensor readings and cost inputs, as typed
#[derive(Args, Debug, Clone, Default)]
pub struct PredictArgs {
    /// Machine identifier
    #[arg(long)]
    pub machine_id: Option<String>,

    /// Air temperature [K]
    #[arg(long)]
    pub air_temp: Option<String>,

    /// Process temperature [K]
    #[arg(long)]
    pub process_temp: Option<String>,

    /// Rotational speed [rpm]
    #[arg(long)]
    pub rpm: Option<String>,

    /// Torque [Nm]
    #[arg(long)]
    pub torque: Option<String>,

    /// Cost of one breakdown (uses the configured default if omitted)
    #[arg(long)]
    pub breakdown_cost: Option<String>,

    /// Expected failures per month (uses the configured default if omitted)
    #[arg(long)]
    pub failures_per_month: Option<String>,
}

impl PredictArgs {
    /// True when no reading was given at all
    pub fn is_blank(&self) -> bool {
        [
            &self.machine_id,
            &self.air_temp,
            &self.process_temp,
            &self.rpm,
            &self.torque,
            &self.breakdown_cost,
            &self.failures_per_month,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    pub fn into_form(self) -> PredictionForm {
        PredictionForm {
            machine_id: self.machine_id.unwrap_or_default(),
            air_temp: self.air_temp.unwrap_or_default(),
            process_temp: self.process_temp.unwrap_or_default(),
            rpm: self.rpm.unwrap_or_default(),
            torque: self.torque.unwrap_or_default(),
            breakdown_cost: self.breakdown_cost.unwrap_or_default(),
            failures_per_month: self.failures_per_month.unwrap_or_default(),
        }
    }
}

/// History filters and sort order
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Filter by machine id
    #[arg(long, short)]
    pub machine: Option<String>,

    /// Filter by risk level (LOW, MEDIUM, HIGH)
    #[arg(long)]
    pub risk: Option<String>,

    /// Filter by date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Sort order by timestamp (asc, desc)
    #[arg(long, default_value = "desc")]
    pub sort: String,
}

impl ViewArgs {
    fn parse(&self) -> Result<(FilterState, SortOrder)> {
        let filters = FilterState::from_inputs(
            self.machine.as_deref().unwrap_or_default(),
            self.risk.as_deref().unwrap_or_default(),
            self.date.as_deref().unwrap_or_default(),
        )
        .map_err(|e| anyhow!(e))?;
        let sort = self.sort.parse::<SortOrder>().map_err(|e| anyhow!(e))?;
        Ok((filters, sort))
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = config::load(cli.config.as_deref(), cli.api_url.as_deref())?;
    let client = ApiClient::from_config(&config)?;
    let session_id = format!("cli-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    let mut dashboard = Dashboard::new(
        config,
        Services::http(client),
        StructuredLogger::new(session_id),
    );

    // Execute command
    match cli.command {
        Commands::Predict(args) => {
            predict::run_prediction(&mut dashboard, args.into_form(), cli.format).await?;
        }
        Commands::History { view, page } => {
            let (filters, sort) = view.parse()?;
            let mut dashboard = dashboard.with_view(filters, sort);
            history::show_history(&mut dashboard, page, cli.format).await?;
        }
        Commands::Export { view, output } => {
            let (filters, sort) = view.parse()?;
            let dashboard = dashboard.with_view(filters, sort);
            export::export_history(&dashboard, &output).await?;
        }
        Commands::Report { prediction, output } => {
            let form = (!prediction.is_blank()).then(|| prediction.into_form());
            report::download_report(&mut dashboard, form, &output).await?;
        }
        Commands::Session => {
            session::run(&mut dashboard, cli.format).await?;
        }
    }

    Ok(())
}
