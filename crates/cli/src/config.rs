//! Configuration loading for the CLI

use anyhow::Result;
use dashboard_lib::DashboardConfig;
use std::path::{Path, PathBuf};

/// Default configuration file: `~/.config/pmd/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("pmd").join("config.toml"))
}

/// Load the dashboard configuration.
///
/// An explicit `--config` path wins over the default location; `--api-url`
/// wins over both the file and `PMD_API_URL`.
pub fn load(explicit: Option<&Path>, api_url: Option<&str>) -> Result<DashboardConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path);
    let mut config = DashboardConfig::load(path.as_deref())?;

    if let Some(url) = api_url {
        config.api_url = url.to_string();
    }

    Ok(config)
}
