//! Process lifecycle: owns the store, the scheduler and the shutdown token,
//! and hands them to the web front.

use crate::background_jobs::jobs::ScrapeDashboardJob;
use crate::background_jobs::{create_scheduler, JobContext, JobScheduler, SchedulerHandle};
use crate::chart::ChartBuilder;
use crate::config::AppConfig;
use crate::scraper::{CoronavirusAppSource, DashboardSource, WebDriverLauncher};
use crate::server::{metrics, run_server};
use crate::snapshot_store::{Metric, SnapshotStore, SqliteSnapshotStore};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct EpimapApp {
    config: AppConfig,
    snapshot_store: Arc<dyn SnapshotStore>,
    scheduler: JobScheduler,
    scheduler_handle: SchedulerHandle,
    shutdown_token: CancellationToken,
}

impl EpimapApp {
    /// Open the database and wire the scrape job to the live dashboard.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let launcher = WebDriverLauncher::new(config.scraper.webdriver_config());
        let source = CoronavirusAppSource::new(
            Box::new(launcher),
            config.scraper.dashboard_url.clone(),
            config.scraper.metric_switch_timeout(),
        );
        Self::with_source(config, Arc::new(source)).await
    }

    pub async fn with_source(config: AppConfig, source: Arc<dyn DashboardSource>) -> Result<Self> {
        let db_path = config.db_path();
        info!("Opening snapshot database at {:?}", db_path);
        let snapshot_store: Arc<dyn SnapshotStore> = Arc::new(
            SqliteSnapshotStore::new(&db_path)
                .with_context(|| format!("Failed to open snapshot database {:?}", db_path))?,
        );

        metrics::init_metrics();
        for metric in Metric::ALL {
            metrics::set_snapshot_rows(metric, snapshot_store.count(metric)?);
        }

        let shutdown_token = CancellationToken::new();
        let job_context = JobContext::new(shutdown_token.child_token(), snapshot_store.clone());
        let (mut scheduler, scheduler_handle) =
            create_scheduler(shutdown_token.clone(), job_context);

        if config.scraper.enabled {
            let job = ScrapeDashboardJob::new(
                source,
                config.scraper.interval(),
                Some(config.scraper.anchor),
                config.scraper.run_on_startup,
            );
            scheduler.register_job(Arc::new(job)).await;
        } else {
            info!("Scraper disabled, serving stored snapshot only");
        }

        Ok(Self {
            config,
            snapshot_store,
            scheduler,
            scheduler_handle,
            shutdown_token,
        })
    }

    pub fn snapshot_store(&self) -> Arc<dyn SnapshotStore> {
        self.snapshot_store.clone()
    }

    pub fn scheduler_handle(&self) -> SchedulerHandle {
        self.scheduler_handle.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn chart_builder(&self) -> ChartBuilder {
        ChartBuilder::new(
            self.config.chart.alignment_policy,
            self.config.chart.play_interval_ms,
        )
    }

    /// Run the web front and the scheduler until either stops or
    /// `shutdown_signal` resolves, then wait for both to wind down.
    pub async fn run<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let chart_builder = self.chart_builder();
        let EpimapApp {
            config,
            snapshot_store,
            mut scheduler,
            scheduler_handle,
            shutdown_token,
        } = self;

        info!("Ready to serve at port {}!", config.port);
        info!("Metrics available at port {}!", config.metrics_port);

        let server = run_server(
            config.server_config(),
            snapshot_store,
            chart_builder,
            Some(scheduler_handle),
            shutdown_token.clone(),
        );
        let scheduler_run = scheduler.run();
        tokio::pin!(server);
        tokio::pin!(scheduler_run);
        tokio::pin!(shutdown_signal);

        tokio::select! {
            result = &mut server => {
                info!("HTTP server stopped: {:?}", result);
                shutdown_token.cancel();
                (&mut scheduler_run).await;
                result
            },
            _ = &mut scheduler_run => {
                info!("Scheduler stopped");
                shutdown_token.cancel();
                (&mut server).await
            },
            _ = &mut shutdown_signal => {
                info!("Received shutdown signal, initiating graceful shutdown");
                shutdown_token.cancel();
                let (result, _) = tokio::join!(&mut server, &mut scheduler_run);
                result
            }
        }
    }
}
