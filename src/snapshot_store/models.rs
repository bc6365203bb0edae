use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two tracked quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Total confirmed cases.
    Total,
    /// Deaths.
    Death,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Total, Metric::Death];

    pub fn table(&self) -> &'static str {
        match self {
            Metric::Total => "country_total",
            Metric::Death => "country_death",
        }
    }

    /// Name of the value column, also used as the CSV header for seed files.
    pub fn value_column(&self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::Death => "death",
        }
    }

    /// Label the dashboard uses for this metric.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Total => "Total cases",
            Metric::Death => "Deaths",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::Death => "death",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A country label paired with a count, as produced by a scrape or a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryValue {
    pub name: String,
    pub value: i64,
}

impl CountryValue {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A stored row of one of the metric tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryRecord {
    pub id: i64,
    pub name: String,
    pub value: i64,
}

/// Both metrics of one refresh, each in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub totals: Vec<CountryValue>,
    pub deaths: Vec<CountryValue>,
}

impl DashboardSnapshot {
    pub fn rows(&self, metric: Metric) -> &[CountryValue] {
        match metric {
            Metric::Total => &self.totals,
            Metric::Death => &self.deaths,
        }
    }
}

/// Metadata of a successful snapshot replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRefresh {
    pub id: i64,
    pub refreshed_at: DateTime<Utc>,
    pub source: String,
    pub total_rows: usize,
    pub death_rows: usize,
}
