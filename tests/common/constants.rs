//! Shared constants for end-to-end tests
//!
//! When seed data changes, update only this file.

// ============================================================================
// Server Lifecycle
// ============================================================================

/// How long to wait for a spawned server to answer
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a triggered job to finish
pub const JOB_WAIT_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Seed Data
// ============================================================================

/// Seeded total cases, in storage order
pub const SEED_TOTALS: &[(&str, i64)] = &[
    ("United States", 42_000_000),
    ("India", 33_000_000),
    ("Brazil", 21_000_000),
    ("Peru", 2_160_000),
];

/// Seeded deaths, in storage order. Peru is deliberately missing.
pub const SEED_DEATHS: &[(&str, i64)] = &[
    ("United States", 680_000),
    ("India", 444_000),
    ("Brazil", 590_000),
];

/// Rows returned by the scripted dashboard
pub const SCRAPED_TOTALS: &[(&str, i64)] = &[("Chile", 1_640_000), ("Japan", 1_670_000)];

pub const SCRAPED_DEATHS: &[(&str, i64)] = &[("Chile", 37_000), ("Japan", 17_000)];

/// Identifier of the scrape job
pub const SCRAPE_JOB_ID: &str = "scrape_dashboard";
