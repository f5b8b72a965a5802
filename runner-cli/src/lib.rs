use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv_sink_core::config::{ExportConfig, ExportJob};
use csv_sink_sqlite::{export_table, register_module};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Outcome of one export job, printed as a JSON line by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub table: String,
    pub output: PathBuf,
    pub rows: usize,
    pub bytes: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Runs one job on its own connection. Blocks the calling thread.
pub fn run_job(database: &Path, job: &ExportJob) -> Result<ExportSummary> {
    let started_at = Utc::now();
    let timer = Instant::now();

    // no CREATE flag: a mistyped path must not leave an empty database behind
    let conn = Connection::open_with_flags(
        database,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
    )
    .with_context(|| format!("failed to open database {}", database.display()))?;
    register_module(&conn)?;

    let rows = export_table(&conn, &job.table, &job.output, job.separator)
        .with_context(|| format!("failed to export table {}", job.table))?;
    let bytes = std::fs::metadata(&job.output)
        .with_context(|| format!("failed to stat {}", job.output.display()))?
        .len();

    Ok(ExportSummary {
        table: job.table.clone(),
        output: job.output.clone(),
        rows,
        bytes,
        started_at,
        elapsed_ms: timer.elapsed().as_millis() as u64,
    })
}

/// Runs every job concurrently on the blocking pool. Results come back in
/// job order.
pub async fn run_jobs(config: &ExportConfig) -> Vec<Result<ExportSummary>> {
    info!(
        database = %config.database.display(),
        jobs = config.jobs.len(),
        "starting csv export"
    );

    let tasks = config.jobs.iter().cloned().map(|job| {
        let database = config.database.clone();
        tokio::task::spawn_blocking(move || run_job(&database, &job))
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.context("export task panicked").and_then(|result| result))
        .collect()
}
