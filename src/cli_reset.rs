use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use epimap_server::config::DB_FILE_NAME;
use epimap_server::snapshot_store::{
    load_seed_csv, DashboardSnapshot, Metric, SnapshotStore, SqliteSnapshotStore,
};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

/// Replace the stored snapshot with the contents of two CSV files.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding data.db. The database is created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// CSV with `countries,total` columns.
    #[clap(long, value_parser = parse_path)]
    pub totals: PathBuf,

    /// CSV with `countries,death` columns.
    #[clap(long, value_parser = parse_path)]
    pub deaths: PathBuf,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!("Begin...");

    if !cli_args.db_dir.is_dir() {
        anyhow::bail!("Database directory does not exist: {:?}", cli_args.db_dir);
    }

    // Both files are parsed before the database is touched.
    let snapshot = DashboardSnapshot {
        totals: load_seed_csv(&cli_args.totals, Metric::Total)?,
        deaths: load_seed_csv(&cli_args.deaths, Metric::Death)?,
    };

    let db_path = cli_args.db_dir.join(DB_FILE_NAME);
    let store = SqliteSnapshotStore::new(&db_path)
        .with_context(|| format!("Failed to open snapshot database {:?}", db_path))?;
    store.replace_snapshot(&snapshot, "seed")?;

    info!(
        "Loaded {} totals and {} deaths into {:?}",
        store.count(Metric::Total)?,
        store.count(Metric::Death)?,
        db_path
    );
    info!("Done.");
    Ok(())
}
