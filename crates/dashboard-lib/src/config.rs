//! Dashboard configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{DEFAULT_BREAKDOWN_COST, DEFAULT_FAILURES_PER_MONTH, DEFAULT_PAGE_SIZE};

/// Environment variable prefix, e.g. `PMD_API_URL`
pub const ENV_PREFIX: &str = "PMD";

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the dashboard backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Rows per history page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Breakdown cost used when the form leaves it blank
    #[serde(default = "default_breakdown_cost")]
    pub default_breakdown_cost: f64,

    /// Failures per month used when the form leaves it blank
    #[serde(default = "default_failures_per_month")]
    pub default_failures_per_month: f64,

    /// Transport-level timeout for every HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Symbol prefixed to currency amounts on the metrics panel
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_breakdown_cost() -> f64 {
    DEFAULT_BREAKDOWN_COST
}

fn default_failures_per_month() -> f64 {
    DEFAULT_FAILURES_PER_MONTH
}

fn default_request_timeout() -> u64 {
    30
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            default_breakdown_cost: default_breakdown_cost(),
            default_failures_per_month: default_failures_per_month(),
            request_timeout_secs: default_request_timeout(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from an optional file, then `PMD_*` environment variables.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read dashboard configuration")?;

        let mut loaded: DashboardConfig = config
            .try_deserialize()
            .context("Failed to parse dashboard configuration")?;
        loaded.page_size = loaded.page_size.max(1);
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.default_breakdown_cost, 50000.0);
        assert_eq!(config.default_failures_per_month, 3.0);
        assert_eq!(config.currency_symbol, "₹");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DashboardConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.page_size, DashboardConfig::default().page_size);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "api_url = \"http://plant-7:8000\"").unwrap();
        writeln!(file, "page_size = 25").unwrap();
        drop(file);

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api_url, "http://plant-7:8000");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "page_size = 0\n").unwrap();

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.page_size, 1);
    }
}
