//! Specific background job implementations.

pub mod scrape_dashboard;

pub use scrape_dashboard::ScrapeDashboardJob;
