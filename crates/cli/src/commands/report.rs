//! Report download

use anyhow::{Context, Result};
use dashboard_lib::{Dashboard, PredictionForm, SvgChartRenderer};
use std::path::Path;

use super::settle;
use crate::output::{print_info, print_success};

/// Bring the display up to date, then download the report for it.
///
/// With a form, a prediction is run first; without one the report carries
/// placeholder metrics next to the latest history charts.
pub async fn download_report(
    dashboard: &mut Dashboard,
    form: Option<PredictionForm>,
    output: &Path,
) -> Result<()> {
    match form {
        Some(form) => {
            dashboard.submit_prediction(&form)?;
        }
        None => {
            print_info("No readings given; report will show the history only");
            dashboard.refresh_history();
        }
    }
    settle(dashboard).await?;

    write_report(dashboard, output).await
}

/// Download the report for whatever is on screen now
pub async fn write_report(dashboard: &Dashboard, output: &Path) -> Result<()> {
    let document = dashboard
        .download_report(&SvgChartRenderer::default())
        .await?;

    std::fs::write(output, &document)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    print_success(&format!(
        "Report saved to {} ({} bytes)",
        output.display(),
        document.len()
    ));
    Ok(())
}
