//! ECharts timeline choropleth built from the latest snapshot.

mod alignment;
mod builder;
pub mod options;

pub use alignment::{align, mismatched_countries, AlignmentPolicy, CountryMismatch};
pub use builder::{build_frame, compute_bounds, ChartBuilder, DEFAULT_PLAY_INTERVAL_MS};

use crate::snapshot_store::Metric;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No {0} rows to chart")]
    EmptySnapshot(Metric),

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("Failed to serialize chart: {0}")]
    Serialize(#[from] serde_json::Error),
}
