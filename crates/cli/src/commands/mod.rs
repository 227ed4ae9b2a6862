//! Subcommand implementations

pub mod export;
pub mod history;
pub mod predict;
pub mod report;
pub mod session;

use anyhow::Result;
use dashboard_lib::Dashboard;
use tracing::warn;

/// Apply every outstanding completion.
///
/// Silent outcomes are skipped; the first user-visible failure is returned
/// after everything has been handled.
pub async fn settle(dashboard: &mut Dashboard) -> Result<()> {
    let mut first_failure = None;
    for outcome in dashboard.settle().await {
        if let Err(e) = outcome {
            if e.is_silent() {
                continue;
            }
            if first_failure.is_some() {
                warn!(kind = e.kind(), error = %e, "Additional failure while settling");
            } else {
                first_failure = Some(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
