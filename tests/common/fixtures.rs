//! Seed data and scripted dashboards for end-to-end tests

use super::constants::*;
use anyhow::Result;
use epimap_server::scraper::{DashboardSource, ScrapeError};
use epimap_server::snapshot_store::{CountryValue, DashboardSnapshot, SnapshotStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn rows(pairs: &[(&str, i64)]) -> Vec<CountryValue> {
    pairs
        .iter()
        .map(|(name, value)| CountryValue::new(*name, *value))
        .collect()
}

/// Replace the store contents with [`SEED_TOTALS`] and [`SEED_DEATHS`].
pub fn seed_snapshot(store: &dyn SnapshotStore) -> Result<()> {
    let snapshot = DashboardSnapshot {
        totals: rows(SEED_TOTALS),
        deaths: rows(SEED_DEATHS),
    };
    store.replace_snapshot(&snapshot, "seed")
}

/// Write the seed data as the two CSV files the reset command reads.
/// Returns (totals_path, deaths_path).
pub fn write_seed_csvs(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let totals_path = dir.join("epiTotal.csv");
    let deaths_path = dir.join("epiDeath.csv");

    let mut totals = csv::Writer::from_path(&totals_path)?;
    totals.write_record(["countries", "total"])?;
    for (name, value) in SEED_TOTALS {
        totals.write_record([name.to_string(), value.to_string()])?;
    }
    totals.flush()?;

    let mut deaths = csv::Writer::from_path(&deaths_path)?;
    deaths.write_record(["countries", "death"])?;
    for (name, value) in SEED_DEATHS {
        deaths.write_record([name.to_string(), value.to_string()])?;
    }
    deaths.flush()?;

    Ok((totals_path, deaths_path))
}

/// A dashboard that returns [`SCRAPED_TOTALS`]/[`SCRAPED_DEATHS`] or fails,
/// optionally blocking until released.
pub struct ScriptedSource {
    fail: bool,
    released: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            released: Arc::new(AtomicBool::new(true)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    /// Fetches block until the returned flag is set.
    pub fn held() -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let source = Self {
            released: released.clone(),
            ..Self::succeeding()
        };
        (source, released)
    }

    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        self.fetches.clone()
    }
}

impl DashboardSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self) -> Result<DashboardSnapshot, ScrapeError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        while !self.released.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(10));
        }
        if self.fail {
            return Err(ScrapeError::CountMismatch {
                labels: 3,
                values: 2,
            });
        }
        Ok(DashboardSnapshot {
            totals: rows(SCRAPED_TOTALS),
            deaths: rows(SCRAPED_DEATHS),
        })
    }
}
