//! Extraction of per-country counts from the live dashboard.
//!
//! The rest of the crate only sees [`DashboardSource`]; how the numbers are
//! obtained (a WebDriver-controlled browser today) stays inside this module.

mod dashboard;
mod parse;
mod session;
mod webdriver;

pub use dashboard::{CoronavirusAppSource, DEFAULT_DASHBOARD_URL};
pub use parse::parse_count;
pub use session::{BrowserLauncher, BrowserSession, ElementRef};
pub use webdriver::{WebDriverConfig, WebDriverLauncher, WebDriverSession, DEFAULT_WEBDRIVER_URL};

use crate::snapshot_store::DashboardSnapshot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("Timed out after {timeout_ms}ms waiting for {xpath}")]
    Timeout { xpath: String, timeout_ms: u64 },

    #[error("Cannot parse count from {0:?}")]
    Parse(String),

    #[error("Found {labels} country labels but {values} values")]
    CountMismatch { labels: usize, values: usize },

    #[error("WebDriver protocol error: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Produces a fresh snapshot of both metrics.
///
/// `fetch` blocks; callers on the async runtime run it via `spawn_blocking`.
pub trait DashboardSource: Send + Sync {
    /// Short identifier used in logs and refresh records.
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<DashboardSnapshot, ScrapeError>;
}
