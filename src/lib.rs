//! Epimap Server Library
//!
//! Scrapes per-country pandemic counts, keeps the latest snapshot in SQLite
//! and serves it as an animated world map.

pub mod app;
pub mod background_jobs;
pub mod chart;
pub mod config;
pub mod scraper;
pub mod server;
pub mod snapshot_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use app::EpimapApp;
pub use chart::{AlignmentPolicy, ChartBuilder};
pub use server::{run_server, RequestsLoggingLevel};
pub use snapshot_store::{SnapshotStore, SqliteSnapshotStore};
