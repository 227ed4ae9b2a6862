//! CSV export

use anyhow::{Context, Result};
use dashboard_lib::Dashboard;
use std::path::Path;

use crate::output::{print_success, print_warning};

/// Download the filtered history as CSV and write it to `output`
pub async fn export_history(dashboard: &Dashboard, output: &Path) -> Result<()> {
    let csv = dashboard.export_csv().await?;
    if csv.is_empty() {
        print_warning("Export returned no data");
    }

    std::fs::write(output, &csv)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    print_success(&format!(
        "Exported {} bytes to {}",
        csv.len(),
        output.display()
    ));
    Ok(())
}
