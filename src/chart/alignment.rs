use crate::snapshot_store::CountryValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do with countries that appear in only one of the two metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentPolicy {
    /// Keep every row, log the mismatch.
    #[default]
    Flag,
    /// Keep only countries present in both metrics.
    Drop,
    /// Add the missing countries to the other metric with a count of 0.
    ZeroFill,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryMismatch {
    pub only_in_totals: Vec<String>,
    pub only_in_deaths: Vec<String>,
}

impl CountryMismatch {
    pub fn is_empty(&self) -> bool {
        self.only_in_totals.is_empty() && self.only_in_deaths.is_empty()
    }
}

fn names(rows: &[CountryValue]) -> HashSet<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
}

/// Countries present in one metric but not the other, in row order.
pub fn mismatched_countries(totals: &[CountryValue], deaths: &[CountryValue]) -> CountryMismatch {
    let total_names = names(totals);
    let death_names = names(deaths);
    CountryMismatch {
        only_in_totals: totals
            .iter()
            .filter(|r| !death_names.contains(r.name.as_str()))
            .map(|r| r.name.clone())
            .collect(),
        only_in_deaths: deaths
            .iter()
            .filter(|r| !total_names.contains(r.name.as_str()))
            .map(|r| r.name.clone())
            .collect(),
    }
}

/// Apply `policy` to both row sets. Row order is preserved; zero-filled rows
/// are appended in the order of the metric they came from.
pub fn align(
    policy: AlignmentPolicy,
    totals: Vec<CountryValue>,
    deaths: Vec<CountryValue>,
) -> (Vec<CountryValue>, Vec<CountryValue>) {
    match policy {
        AlignmentPolicy::Flag => (totals, deaths),
        AlignmentPolicy::Drop => {
            let mismatch = mismatched_countries(&totals, &deaths);
            let drop_totals: HashSet<_> = mismatch.only_in_totals.into_iter().collect();
            let drop_deaths: HashSet<_> = mismatch.only_in_deaths.into_iter().collect();
            (
                totals
                    .into_iter()
                    .filter(|r| !drop_totals.contains(&r.name))
                    .collect(),
                deaths
                    .into_iter()
                    .filter(|r| !drop_deaths.contains(&r.name))
                    .collect(),
            )
        }
        AlignmentPolicy::ZeroFill => {
            let mismatch = mismatched_countries(&totals, &deaths);
            let mut totals = totals;
            let mut deaths = deaths;
            totals.extend(
                mismatch
                    .only_in_deaths
                    .into_iter()
                    .map(|name| CountryValue::new(name, 0)),
            );
            deaths.extend(
                mismatch
                    .only_in_totals
                    .into_iter()
                    .map(|name| CountryValue::new(name, 0)),
            );
            (totals, deaths)
        }
    }
}
