use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::sink::emitter::RecordStats;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csv_sink=info,csv_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Running totals for one sink. The header counts towards `bytes_written`
/// but not towards `rows_written`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SinkMetrics {
    pub rows_written: u64,
    pub bytes_written: u64,
    pub null_fields: u64,
    pub quoted_fields: u64,
}

impl SinkMetrics {
    pub fn record_header(&mut self, bytes: usize) {
        self.bytes_written += bytes as u64;
    }

    pub fn record_row(&mut self, stats: &RecordStats, bytes: usize) {
        self.rows_written += 1;
        self.bytes_written += bytes as u64;
        self.null_fields += stats.null_fields as u64;
        self.quoted_fields += stats.quoted_fields as u64;
    }
}
