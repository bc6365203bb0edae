use crate::snapshot_store::SnapshotStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context provided to jobs during execution.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    /// The latest-snapshot database.
    pub snapshot_store: Arc<dyn SnapshotStore>,
}

impl JobContext {
    pub fn new(cancellation_token: CancellationToken, snapshot_store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            cancellation_token,
            snapshot_store,
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
