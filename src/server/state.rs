use axum::extract::FromRef;

use crate::background_jobs::SchedulerHandle;
use crate::chart::ChartBuilder;
use crate::snapshot_store::SnapshotStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSnapshotStore = Arc<dyn SnapshotStore>;
pub type OptionalSchedulerHandle = Option<SchedulerHandle>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub snapshot_store: GuardedSnapshotStore,
    pub chart_builder: ChartBuilder,
    pub scheduler_handle: OptionalSchedulerHandle,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        snapshot_store: GuardedSnapshotStore,
        chart_builder: ChartBuilder,
        scheduler_handle: OptionalSchedulerHandle,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            snapshot_store,
            chart_builder,
            scheduler_handle,
        }
    }
}

impl FromRef<ServerState> for GuardedSnapshotStore {
    fn from_ref(input: &ServerState) -> Self {
        input.snapshot_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for OptionalSchedulerHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.scheduler_handle.clone()
    }
}
