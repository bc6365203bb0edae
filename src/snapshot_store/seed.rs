use super::models::{CountryValue, Metric};
use crate::scraper::parse_count;
use anyhow::{bail, Context, Result};
use std::path::Path;

const COUNTRY_HEADER: &str = "countries";

/// Read a seed CSV with a `countries` column and the metric's value column
/// (`total` or `death`). Rows are returned in file order.
pub fn load_seed_csv<P: AsRef<Path>>(path: P, metric: Metric) -> Result<Vec<CountryValue>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open seed file {:?}", path))?;

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(country_idx) = position(COUNTRY_HEADER) else {
        bail!("Seed file {:?} has no '{}' column", path, COUNTRY_HEADER);
    };
    let Some(value_idx) = position(metric.value_column()) else {
        bail!(
            "Seed file {:?} has no '{}' column",
            path,
            metric.value_column()
        );
    };

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed record in {:?}", path))?;
        let name = record.get(country_idx).unwrap_or_default().trim();
        let raw_value = record.get(value_idx).unwrap_or_default();
        if name.is_empty() {
            bail!("Empty country name on data row {} of {:?}", line + 1, path);
        }
        let value = parse_count(raw_value)
            .with_context(|| format!("Bad {} value for {:?} in {:?}", metric, name, path))?;
        rows.push(CountryValue::new(name, value));
    }
    Ok(rows)
}
