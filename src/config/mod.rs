mod file_config;

pub use file_config::{ChartConfig, FileConfig, ScraperConfig};

use crate::chart::{AlignmentPolicy, DEFAULT_PLAY_INTERVAL_MS};
use crate::scraper::{WebDriverConfig, DEFAULT_DASHBOARD_URL, DEFAULT_WEBDRIVER_URL};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the SQLite database inside `db_dir`.
pub const DB_FILE_NAME: &str = "data.db";

/// Longest accepted scrape interval: one leap year.
pub const MAX_INTERVAL_HOURS: u64 = 366 * 24;

/// Settings for the dashboard scraper and its schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperSettings {
    pub enabled: bool,
    pub webdriver_url: String,
    pub dashboard_url: String,
    pub interval_hours: u64,
    pub anchor: DateTime<Utc>,
    pub run_on_startup: bool,
    pub metric_switch_timeout_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub request_timeout_sec: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            interval_hours: 12,
            anchor: default_anchor(),
            run_on_startup: false,
            metric_switch_timeout_ms: 1000,
            window_width: 1920,
            window_height: 1080,
            request_timeout_sec: 60,
        }
    }
}

impl ScraperSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }

    pub fn metric_switch_timeout(&self) -> Duration {
        Duration::from_millis(self.metric_switch_timeout_ms)
    }

    pub fn webdriver_config(&self) -> WebDriverConfig {
        WebDriverConfig {
            webdriver_url: self.webdriver_url.clone(),
            window_width: self.window_width,
            window_height: self.window_height,
            request_timeout_sec: self.request_timeout_sec,
        }
    }
}

/// Settings for the map chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub alignment_policy: AlignmentPolicy,
    pub play_interval_ms: u64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            alignment_policy: AlignmentPolicy::default(),
            play_interval_ms: DEFAULT_PLAY_INTERVAL_MS,
        }
    }
}

fn default_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 9, 3, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub static_dir: Option<PathBuf>,
    pub webdriver_url: Option<String>,
    pub scrape_on_startup: bool,
    pub disable_scraper: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub static_dir: Option<PathBuf>,

    // Feature configs (with defaults)
    pub scraper: ScraperSettings,
    pub chart: ChartSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let static_dir = file
            .static_dir
            .map(PathBuf::from)
            .or_else(|| cli.static_dir.clone());

        let scraper_file = file.scraper.unwrap_or_default();
        let defaults = ScraperSettings::default();
        let anchor = match scraper_file.anchor {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .with_context(|| format!("Invalid scraper anchor: {}", raw))?
                .with_timezone(&Utc),
            None => defaults.anchor,
        };
        let interval_hours = scraper_file
            .interval_hours
            .unwrap_or(defaults.interval_hours);
        if interval_hours == 0 {
            bail!("scraper.interval_hours must be greater than zero");
        }
        if interval_hours > MAX_INTERVAL_HOURS {
            bail!(
                "scraper.interval_hours must be at most {} (got {})",
                MAX_INTERVAL_HOURS,
                interval_hours
            );
        }
        let scraper = ScraperSettings {
            enabled: scraper_file.enabled.unwrap_or(!cli.disable_scraper),
            webdriver_url: scraper_file
                .webdriver_url
                .or_else(|| cli.webdriver_url.clone())
                .unwrap_or(defaults.webdriver_url),
            dashboard_url: scraper_file.dashboard_url.unwrap_or(defaults.dashboard_url),
            interval_hours,
            anchor,
            run_on_startup: scraper_file
                .run_on_startup
                .unwrap_or(cli.scrape_on_startup),
            metric_switch_timeout_ms: scraper_file
                .metric_switch_timeout_ms
                .unwrap_or(defaults.metric_switch_timeout_ms),
            window_width: scraper_file.window_width.unwrap_or(defaults.window_width),
            window_height: scraper_file.window_height.unwrap_or(defaults.window_height),
            request_timeout_sec: scraper_file
                .request_timeout_sec
                .unwrap_or(defaults.request_timeout_sec),
        };

        let chart_file = file.chart.unwrap_or_default();
        let chart_defaults = ChartSettings::default();
        let chart = ChartSettings {
            alignment_policy: chart_file
                .alignment_policy
                .unwrap_or(chart_defaults.alignment_policy),
            play_interval_ms: chart_file
                .play_interval_ms
                .unwrap_or(chart_defaults.play_interval_ms),
        };

        Ok(AppConfig {
            db_dir,
            port,
            metrics_port,
            logging_level,
            static_dir,
            scraper,
            chart,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(DB_FILE_NAME)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            static_dir: self.static_dir.clone(),
        }
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
