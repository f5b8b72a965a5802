//! Write-only CSV sink: parses table parameters, derives the column schema
//! and serializes inserted rows as delimited, quoted records.

pub mod config;
pub mod errors;
pub mod schema;
pub mod sink;
pub mod telemetry;

pub use config::{ExportConfig, ExportJob, SinkConfig, SinkParams};
pub use errors::{ConfigError, Result, SinkError, UnsupportedOperation};
pub use schema::Columns;
pub use sink::emitter::{LINE_TERMINATOR, RowEmitter};
pub use sink::writer::CsvSink;
pub use sink::{Sink, SinkState};
