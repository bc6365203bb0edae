//! SQLite schema definitions for the snapshot database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Metric tables
// =============================================================================

/// Latest total confirmed cases per country.
const COUNTRY_TOTAL_TABLE_V1: Table = Table {
    name: "country_total",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("total", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

/// Latest deaths per country.
const COUNTRY_DEATH_TABLE_V1: Table = Table {
    name: "country_death",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("death", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

// =============================================================================
// Version 2 - Refresh bookkeeping
// =============================================================================

const SNAPSHOT_REFRESH_TABLE_V2: Table = Table {
    name: "snapshot_refresh",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("refreshed_at", &SqlType::Text, non_null = true),
        sqlite_column!("source", &SqlType::Text, non_null = true),
        sqlite_column!("total_rows", &SqlType::Integer, non_null = true),
        sqlite_column!("death_rows", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_snapshot_refresh_at", "refreshed_at DESC")],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE snapshot_refresh (
            id INTEGER PRIMARY KEY,
            refreshed_at TEXT NOT NULL,
            source TEXT NOT NULL,
            total_rows INTEGER NOT NULL,
            death_rows INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX idx_snapshot_refresh_at ON snapshot_refresh(refreshed_at DESC)",
        [],
    )?;
    Ok(())
}

pub const SNAPSHOT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[COUNTRY_TOTAL_TABLE_V1, COUNTRY_DEATH_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[
            COUNTRY_TOTAL_TABLE_V1,
            COUNTRY_DEATH_TABLE_V1,
            SNAPSHOT_REFRESH_TABLE_V2,
        ],
        migration: Some(migrate_v1_to_v2),
    },
];
