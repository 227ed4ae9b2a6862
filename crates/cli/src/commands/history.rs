//! History browsing

use anyhow::Result;
use dashboard_lib::Dashboard;

use super::settle;
use crate::output::{print_history, print_json, OutputFormat};

/// Fetch one page of history for the dashboard's current view and print it
pub async fn show_history(dashboard: &mut Dashboard, page: u32, format: OutputFormat) -> Result<()> {
    dashboard.go_to_page(page);
    settle(dashboard).await?;

    let snapshot = dashboard.snapshot();
    match format {
        OutputFormat::Json => print_json(&snapshot.history)?,
        OutputFormat::Table => print_history(
            snapshot,
            &dashboard.config().currency_symbol,
            dashboard.pager().page_number(),
        ),
    }
    Ok(())
}
