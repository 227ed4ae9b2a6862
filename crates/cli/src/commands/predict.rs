//! One-shot prediction

use anyhow::Result;
use dashboard_lib::{Dashboard, PredictionForm};

use super::settle;
use crate::output::{print_json, print_snapshot, OutputFormat};

/// Submit the form, wait for the prediction and the history refresh it triggers, then print both
pub async fn run_prediction(
    dashboard: &mut Dashboard,
    form: PredictionForm,
    format: OutputFormat,
) -> Result<()> {
    dashboard.submit_prediction(&form)?;
    settle(dashboard).await?;

    match format {
        OutputFormat::Json => print_json(&dashboard.snapshot().metrics)?,
        OutputFormat::Table => print_snapshot(
            dashboard.snapshot(),
            &dashboard.config().currency_symbol,
            dashboard.pager().page_number(),
            format,
        )?,
    }
    Ok(())
}
