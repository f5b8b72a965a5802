use std::fs::File;
use std::io::Write;

use tracing::{debug, info, warn};

use crate::config::SinkConfig;
use crate::errors::{Result, SinkError, UnsupportedOperation};
use crate::schema::Columns;
use crate::sink::emitter::RowEmitter;
use crate::sink::{Sink, SinkState};
use crate::telemetry::SinkMetrics;

/// Writes a header and then one CSV record per inserted row.
///
/// Each record is encoded into a scratch buffer and handed to the output with
/// a single `write_all`; nothing is held back between inserts. A row that
/// does not match the column count is rejected before any byte is written.
pub struct CsvSink<W: Write = File> {
    config: SinkConfig,
    emitter: RowEmitter,
    out: Option<W>,
    line: Vec<u8>,
    metrics: SinkMetrics,
}

impl CsvSink<File> {
    /// Creates or truncates `config.filename` and writes the header.
    pub fn create(config: SinkConfig) -> Result<Self> {
        let file = File::create(&config.filename).map_err(|source| SinkError::SinkOpen {
            path: config.filename.clone(),
            source,
        })?;
        Self::from_writer(config, file)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(config: SinkConfig, writer: W) -> Result<Self> {
        let mut sink = Self {
            emitter: RowEmitter::new(config.separator),
            config,
            out: Some(writer),
            line: Vec::new(),
            metrics: SinkMetrics::default(),
        };
        sink.write_header()?;

        info!(
            path = %sink.config.filename.display(),
            columns = sink.config.columns.len(),
            separator = %(sink.config.separator as char).escape_default(),
            "opened csv sink"
        );
        Ok(sink)
    }

    fn write_header(&mut self) -> Result<()> {
        let out = self
            .out
            .as_mut()
            .ok_or(UnsupportedOperation::WriteAfterClose)?;

        self.line.clear();
        self.emitter
            .encode_record(self.config.columns.iter().map(Some), &mut self.line);
        out.write_all(&self.line)?;
        self.metrics.record_header(self.line.len());
        Ok(())
    }

    pub fn insert_row<I, F>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<F>>,
        F: AsRef<[u8]>,
    {
        let Some(out) = self.out.as_mut() else {
            return Err(UnsupportedOperation::WriteAfterClose.into());
        };

        self.line.clear();
        let stats = self.emitter.encode_record(row, &mut self.line);
        if stats.fields != self.config.columns.len() {
            return Err(SinkError::RowWidth {
                expected: self.config.columns.len(),
                actual: stats.fields,
            });
        }

        out.write_all(&self.line)?;
        self.metrics.record_row(&stats, self.line.len());
        debug!(bytes = self.line.len(), "wrote row");
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        let Some(mut out) = self.out.take() else {
            return Ok(());
        };
        out.flush()?;
        drop(out);

        info!(
            path = %self.config.filename.display(),
            rows = self.metrics.rows_written,
            bytes = self.metrics.bytes_written,
            "closed csv sink"
        );
        Ok(())
    }

    pub fn state(&self) -> SinkState {
        if self.out.is_some() {
            SinkState::Open
        } else {
            SinkState::Closed
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn columns(&self) -> &Columns {
        &self.config.columns
    }

    pub fn schema_declaration(&self) -> String {
        self.config.columns.schema_declaration()
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

impl<W: Write> Drop for CsvSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.config.filename.display(), error = %e, "failed to close csv sink");
        }
    }
}

impl Sink for CsvSink<File> {
    type Config = SinkConfig;

    fn open(config: SinkConfig) -> Result<Self> {
        Self::create(config)
    }

    fn insert_row<I, F>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<F>>,
        F: AsRef<[u8]>,
    {
        CsvSink::insert_row(self, row)
    }

    fn close(&mut self) -> Result<()> {
        CsvSink::close(self)
    }

    fn state(&self) -> SinkState {
        CsvSink::state(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(columns: &str, separator: u8) -> SinkConfig {
        SinkConfig {
            filename: PathBuf::from("memory.csv"),
            columns: Columns::parse(columns),
            separator,
        }
    }

    #[test]
    fn test_header_written_on_open() {
        let mut buf = Vec::new();
        let sink = CsvSink::from_writer(config("id,name", b','), &mut buf).unwrap();
        assert_eq!(sink.state(), SinkState::Open);
        drop(sink);
        assert_eq!(buf, b"id,name\r\n");
    }

    #[test]
    fn test_header_escapes_names() {
        let mut buf = Vec::new();
        drop(CsvSink::from_writer(config("a;b,first name", b';'), &mut buf).unwrap());
        assert_eq!(buf, b"\"a;b\";\"first name\"\r\n");
    }

    #[test]
    fn test_header_doubles_quotes_in_names() {
        let mut buf = Vec::new();
        drop(CsvSink::from_writer(config("say \"hi\",b", b','), &mut buf).unwrap());
        assert_eq!(buf, b"\"say \"\"hi\"\"\",b\r\n");
    }

    #[test]
    fn test_rows_follow_header() {
        let mut buf = Vec::new();
        let mut sink = CsvSink::from_writer(config("id,name", b','), &mut buf).unwrap();
        sink.insert_row([Some("1"), Some("O'Brien, Jr.")]).unwrap();
        sink.insert_row([Some("2"), None]).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.state(), SinkState::Closed);
        assert_eq!(sink.metrics().rows_written, 2);
        assert_eq!(sink.metrics().null_fields, 1);
        assert_eq!(sink.metrics().quoted_fields, 1);
        drop(sink);
        assert_eq!(buf, b"id,name\r\n1,\"O'Brien, Jr.\"\r\n2,\r\n");
    }

    #[test]
    fn test_write_after_close_is_rejected() {
        let mut buf = Vec::new();
        let mut sink = CsvSink::from_writer(config("a", b','), &mut buf).unwrap();
        sink.close().unwrap();
        let err = sink.insert_row([Some("x")]).unwrap_err();
        assert!(matches!(
            err,
            SinkError::Unsupported(UnsupportedOperation::WriteAfterClose)
        ));
        sink.close().unwrap();
        drop(sink);
        assert_eq!(buf, b"a\r\n");
    }

    #[test]
    fn test_row_width_mismatch_writes_nothing() {
        let mut buf = Vec::new();
        let mut sink = CsvSink::from_writer(config("a,b", b','), &mut buf).unwrap();
        let err = sink.insert_row([Some("only one")]).unwrap_err();
        assert!(matches!(
            err,
            SinkError::RowWidth {
                expected: 2,
                actual: 1
            }
        ));
        sink.insert_row([Some("x"), Some("y")]).unwrap();
        drop(sink);
        assert_eq!(buf, b"a,b\r\nx,y\r\n");
    }

    #[test]
    fn test_metrics_count_bytes() {
        let mut buf = Vec::new();
        let mut sink = CsvSink::from_writer(config("id", b','), &mut buf).unwrap();
        sink.insert_row([Some("42")]).unwrap();
        assert_eq!(sink.metrics().bytes_written, 8);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_header_write_failure_fails_open() {
        let err = CsvSink::from_writer(config("a", b','), FailingWriter)
            .err()
            .unwrap();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
