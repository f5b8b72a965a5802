use anyhow::{Result, bail};
use csv_export::run_jobs;
use csv_sink_core::config::ExportConfig;
use csv_sink_core::telemetry::init_tracing;
use tracing::{error, info};

/// Exports SQLite tables to CSV files.
///
/// What it does at a high-level:
///     Load config from the path in the first argument, or from CSV_EXPORT_CONFIG.
///     Run every job, each through a temporary csv_writer table.
///     Print one JSON summary line per finished job.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => ExportConfig::from_file(&path)?,
        None => ExportConfig::from_env()?,
    };
    config.validate()?;

    let results = run_jobs(&config).await;
    let total = results.len();
    let mut failed = 0;

    for (job, result) in config.jobs.iter().zip(results) {
        match result {
            Ok(summary) => println!("{}", serde_json::to_string(&summary)?),
            Err(e) => {
                error!(table = %job.table, error = ?e, "export job failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} export jobs failed");
    }
    info!(jobs = total, "csv export finished");
    Ok(())
}
