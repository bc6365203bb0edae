use anyhow::Result;
use clap::Parser;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use epimap_server::config;
use epimap_server::server::RequestsLoggingLevel;
use epimap_server::EpimapApp;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding data.db. Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory to be statically served under /static.
    #[clap(long, value_parser = parse_dir)]
    pub static_dir: Option<PathBuf>,

    /// URL of the WebDriver server driving the headless browser.
    #[clap(long)]
    pub webdriver_url: Option<String>,

    /// Scrape once right after startup instead of waiting for the next slot.
    #[clap(long)]
    pub scrape_on_startup: bool,

    /// Serve the stored snapshot without ever scraping.
    #[clap(long)]
    pub disable_scraper: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            static_dir: args.static_dir.clone(),
            webdriver_url: args.webdriver_url.clone(),
            scrape_on_startup: args.scrape_on_startup,
            disable_scraper: args.disable_scraper,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // TOML overrides CLI
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!(
        "  scraper: {} (every {}h from {}, webdriver {})",
        if app_config.scraper.enabled {
            "enabled"
        } else {
            "disabled"
        },
        app_config.scraper.interval_hours,
        app_config.scraper.anchor.to_rfc3339(),
        app_config.scraper.webdriver_url
    );
    info!("  alignment policy: {:?}", app_config.chart.alignment_policy);

    let app = EpimapApp::new(app_config).await?;

    app.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
