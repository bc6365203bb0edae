//! Periodic refresh of the snapshot from the live dashboard.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, HookEvent, JobError, JobSchedule},
};
use crate::scraper::DashboardSource;
use crate::server::metrics;
use crate::snapshot_store::Metric;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct ScrapeDashboardJob {
    source: Arc<dyn DashboardSource>,
    every: Duration,
    anchor: Option<DateTime<Utc>>,
    run_on_startup: bool,
}

impl ScrapeDashboardJob {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        every: Duration,
        anchor: Option<DateTime<Utc>>,
        run_on_startup: bool,
    ) -> Self {
        Self {
            source,
            every,
            anchor,
            run_on_startup,
        }
    }
}

impl BackgroundJob for ScrapeDashboardJob {
    fn id(&self) -> &'static str {
        "scrape_dashboard"
    }

    fn name(&self) -> &'static str {
        "Scrape Dashboard"
    }

    fn description(&self) -> &'static str {
        "Scrape per-country totals and deaths and replace the stored snapshot"
    }

    fn schedule(&self) -> JobSchedule {
        if self.run_on_startup {
            JobSchedule::Combined {
                every: Some(self.every),
                anchor: self.anchor,
                hooks: vec![HookEvent::OnStartup],
            }
        } else {
            JobSchedule::Interval {
                every: self.every,
                anchor: self.anchor,
            }
        }
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let snapshot = self
            .source
            .fetch()
            .map_err(|e| JobError::ExecutionFailed(format!("{} scrape: {}", self.source.name(), e)))?;

        // An empty sidebar means the page did not render as expected.
        for metric in Metric::ALL {
            if snapshot.rows(metric).is_empty() {
                return Err(JobError::ExecutionFailed(format!(
                    "{} scrape returned no {} rows",
                    self.source.name(),
                    metric
                )));
            }
        }

        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let source = format!("scrape:{}", self.source.name());
        ctx.snapshot_store
            .replace_snapshot(&snapshot, &source)
            .map_err(|e| JobError::ExecutionFailed(format!("Failed to store snapshot: {:#}", e)))?;

        for metric in Metric::ALL {
            metrics::set_snapshot_rows(metric, snapshot.rows(metric).len());
        }
        info!(
            "Snapshot refreshed: {} totals, {} deaths",
            snapshot.totals.len(),
            snapshot.deaths.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::ScrapeError;
    use crate::snapshot_store::{
        CountryValue, DashboardSnapshot, SnapshotStore, SqliteSnapshotStore,
    };
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    enum FakeOutcome {
        Rows(DashboardSnapshot),
        Fails,
    }

    struct FakeSource(FakeOutcome);

    impl DashboardSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch(&self) -> Result<DashboardSnapshot, ScrapeError> {
            match &self.0 {
                FakeOutcome::Rows(snapshot) => Ok(snapshot.clone()),
                FakeOutcome::Fails => Err(ScrapeError::ElementNotFound(
                    r#"//span[text()="Total cases"]"#.to_string(),
                )),
            }
        }
    }

    fn rows(pairs: &[(&str, i64)]) -> Vec<CountryValue> {
        pairs
            .iter()
            .map(|(n, v)| CountryValue::new(*n, *v))
            .collect()
    }

    fn setup() -> (Arc<SqliteSnapshotStore>, JobContext, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteSnapshotStore::new(dir.path().join("data.db")).unwrap());
        let ctx = JobContext::new(CancellationToken::new(), store.clone());
        (store, ctx, dir)
    }

    fn job(outcome: FakeOutcome) -> ScrapeDashboardJob {
        ScrapeDashboardJob::new(
            Arc::new(FakeSource(outcome)),
            Duration::from_secs(12 * 3600),
            None,
            false,
        )
    }

    fn seed(store: &SqliteSnapshotStore) {
        let snapshot = DashboardSnapshot {
            totals: rows(&[("Old", 1)]),
            deaths: rows(&[("Old", 0)]),
        };
        store.replace_snapshot(&snapshot, "seed").unwrap();
    }

    #[test]
    fn successful_scrape_writes_every_extracted_row() {
        let (store, ctx, _dir) = setup();
        seed(&store);
        let snapshot = DashboardSnapshot {
            totals: rows(&[("USA", 40_000_000), ("India", 33_000_000), ("Peru", 2_000_000)]),
            deaths: rows(&[("USA", 650_000), ("India", 440_000)]),
        };

        job(FakeOutcome::Rows(snapshot)).execute(&ctx).unwrap();

        assert_eq!(store.count(Metric::Total).unwrap(), 3);
        assert_eq!(store.count(Metric::Death).unwrap(), 2);
        assert_eq!(store.read_all(Metric::Total).unwrap()[0].name, "USA");
        assert_eq!(store.last_refresh().unwrap().unwrap().source, "scrape:fake");
    }

    #[test]
    fn failed_scrape_leaves_snapshot_untouched() {
        let (store, ctx, _dir) = setup();
        seed(&store);

        let err = job(FakeOutcome::Fails).execute(&ctx).unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed(_)));

        let totals = store.read_all(Metric::Total).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].name, "Old");
        assert_eq!(store.last_refresh().unwrap().unwrap().source, "seed");
    }

    #[test]
    fn empty_scrape_is_rejected() {
        let (store, ctx, _dir) = setup();
        seed(&store);
        let snapshot = DashboardSnapshot {
            totals: rows(&[("USA", 1)]),
            deaths: vec![],
        };

        assert!(job(FakeOutcome::Rows(snapshot)).execute(&ctx).is_err());
        assert_eq!(store.read_all(Metric::Death).unwrap()[0].name, "Old");
    }

    #[test]
    fn cancelled_job_does_not_scrape() {
        let (store, ctx, _dir) = setup();
        ctx.cancellation_token.cancel();
        let snapshot = DashboardSnapshot {
            totals: rows(&[("USA", 1)]),
            deaths: rows(&[("USA", 1)]),
        };

        assert!(matches!(
            job(FakeOutcome::Rows(snapshot)).execute(&ctx),
            Err(JobError::Cancelled)
        ));
        assert_eq!(store.count(Metric::Total).unwrap(), 0);
    }

    #[test]
    fn schedule_includes_startup_hook_when_requested() {
        let anchor = "2021-09-03T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let every = Duration::from_secs(12 * 3600);
        let job = ScrapeDashboardJob::new(
            Arc::new(FakeSource(FakeOutcome::Fails)),
            every,
            Some(anchor),
            true,
        );

        assert!(job.schedule().listens_to(HookEvent::OnStartup));
        assert_eq!(job.schedule().interval(), Some((every, Some(anchor))));
    }
}
