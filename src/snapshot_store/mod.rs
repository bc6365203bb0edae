//! Latest-snapshot cache of the scraped per-country counts.
//!
//! Each metric lives in its own table and is only ever replaced as a whole.

mod models;
mod schema;
mod seed;
mod sqlite_snapshot_store;

pub use models::*;
pub use schema::SNAPSHOT_VERSIONED_SCHEMAS;
pub use seed::load_seed_csv;
pub use sqlite_snapshot_store::SqliteSnapshotStore;

use anyhow::Result;

pub trait SnapshotStore: Send + Sync {
    /// Replace every row of `metric` with `rows`, in order.
    fn replace_all(&self, metric: Metric, rows: &[CountryValue]) -> Result<()>;

    /// All rows of `metric` in storage order.
    fn read_all(&self, metric: Metric) -> Result<Vec<CountryRecord>>;

    /// Replace both metrics and record the refresh, all in one transaction.
    fn replace_snapshot(&self, snapshot: &DashboardSnapshot, source: &str) -> Result<()>;

    fn last_refresh(&self) -> Result<Option<SnapshotRefresh>>;

    fn count(&self, metric: Metric) -> Result<usize>;
}
