use super::models::{CountryRecord, CountryValue, DashboardSnapshot, Metric, SnapshotRefresh};
use super::schema::SNAPSHOT_VERSIONED_SCHEMAS;
use super::SnapshotStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open snapshot database")?;

        if is_new_db {
            info!("Creating new snapshot database at {:?}", path);
            Self::latest_schema().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                bail!(
                    "Snapshot database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let schema = SNAPSHOT_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown snapshot database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Snapshot database schema validation failed for version {}",
                    db_version
                )
            })?;

            let latest_version = Self::latest_schema().version;
            if (db_version as usize) < latest_version {
                info!(
                    "Migrating snapshot database from version {} to {}",
                    db_version, latest_version
                );
                Self::migrate(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn latest_schema() -> &'static crate::sqlite_persistence::VersionedSchema {
        // The schema list is a non-empty constant.
        &SNAPSHOT_VERSIONED_SCHEMAS[SNAPSHOT_VERSIONED_SCHEMAS.len() - 1]
    }

    fn migrate(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut current = from_version;
        for schema in SNAPSHOT_VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
        {
            if let Some(migration) = schema.migration {
                migration(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            current = schema.version;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + current),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Snapshot database lock poisoned"))
    }

    fn check_rows(metric: Metric, rows: &[CountryValue]) -> Result<()> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            if row.value < 0 {
                bail!(
                    "Negative {} count {} for country {:?}",
                    metric,
                    row.value,
                    row.name
                );
            }
            if !seen.insert(row.name.as_str()) {
                bail!("Country {:?} appears twice in {} rows", row.name, metric);
            }
        }
        Ok(())
    }

    fn write_metric(tx: &Transaction, metric: Metric, rows: &[CountryValue]) -> Result<()> {
        Self::check_rows(metric, rows)?;

        tx.execute(&format!("DELETE FROM {}", metric.table()), [])?;

        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (name, {}) VALUES (?1, ?2)",
            metric.table(),
            metric.value_column()
        ))?;
        for row in rows {
            stmt.execute(params![row.name, row.value])
                .with_context(|| format!("Failed to insert {} row for {:?}", metric, row.name))?;
        }
        debug!("Wrote {} {} rows", rows.len(), metric);
        Ok(())
    }

    fn row_to_refresh(row: &rusqlite::Row) -> rusqlite::Result<SnapshotRefresh> {
        let refreshed_at_str: String = row.get("refreshed_at")?;
        let total_rows: i64 = row.get("total_rows")?;
        let death_rows: i64 = row.get("death_rows")?;

        Ok(SnapshotRefresh {
            id: row.get("id")?,
            refreshed_at: DateTime::parse_from_rfc3339(&refreshed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            source: row.get("source")?,
            total_rows: total_rows as usize,
            death_rows: death_rows as usize,
        })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn replace_all(&self, metric: Metric, rows: &[CountryValue]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::write_metric(&tx, metric, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn read_all(&self, metric: Metric) -> Result<Vec<CountryRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, {} FROM {} ORDER BY id",
            metric.value_column(),
            metric.table()
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CountryRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_snapshot(&self, snapshot: &DashboardSnapshot, source: &str) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for metric in Metric::ALL {
            Self::write_metric(&tx, metric, snapshot.rows(metric))?;
        }
        tx.execute(
            "INSERT INTO snapshot_refresh (refreshed_at, source, total_rows, death_rows)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Utc::now().to_rfc3339(),
                source,
                snapshot.totals.len() as i64,
                snapshot.deaths.len() as i64
            ],
        )?;
        tx.commit()?;

        info!(
            "Snapshot replaced from {}: {} totals, {} deaths",
            source,
            snapshot.totals.len(),
            snapshot.deaths.len()
        );
        Ok(())
    }

    fn last_refresh(&self) -> Result<Option<SnapshotRefresh>> {
        let conn = self.lock()?;
        let refresh = conn
            .query_row(
                "SELECT * FROM snapshot_refresh ORDER BY id DESC LIMIT 1",
                [],
                Self::row_to_refresh,
            )
            .optional()?;
        Ok(refresh)
    }

    fn count(&self, metric: Metric) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", metric.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
