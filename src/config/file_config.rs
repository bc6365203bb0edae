use crate::chart::AlignmentPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub static_dir: Option<String>,

    // Feature configs
    pub scraper: Option<ScraperConfig>,
    pub chart: Option<ChartConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScraperConfig {
    pub enabled: Option<bool>,
    pub webdriver_url: Option<String>,
    pub dashboard_url: Option<String>,
    pub interval_hours: Option<u64>,
    /// RFC 3339 timestamp that scheduled runs are aligned to.
    pub anchor: Option<String>,
    pub run_on_startup: Option<bool>,
    pub metric_switch_timeout_ms: Option<u64>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub alignment_policy: Option<AlignmentPolicy>,
    pub play_interval_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
