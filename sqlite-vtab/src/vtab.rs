//! The `csv_writer` virtual table: an insert-only SQLite table whose rows
//! go straight to a CSV file.
//!
//! ```sql
//! CREATE VIRTUAL TABLE temp.out USING csv_writer(
//!     filename='/tmp/out.csv', columns='id,name', separator=','
//! );
//! INSERT INTO out SELECT id, name FROM people;
//! DROP TABLE out;
//! ```

use std::borrow::Cow;
use std::os::raw::c_int;

use csv_sink_core::{CsvSink, SinkConfig, SinkError, UnsupportedOperation};
use rusqlite::ffi;
use rusqlite::types::ValueRef;
use rusqlite::vtab::{
    Context, CreateVTab, IndexInfo, UpdateVTab, VTab, VTabConfig, VTabConnection, VTabCursor,
    VTabKind, Values,
};
use rusqlite::{Error, Result};
use tracing::debug;

/// SQLite passes the module, database and table names ahead of the
/// arguments written in `USING csv_writer(...)`.
const RESERVED_ARGS: usize = 3;

/// In `xUpdate`, the old rowid and the new rowid precede the column values.
const ROWID_ARGS: usize = 2;

#[repr(C)]
pub struct CsvWriterTab {
    /// Base class. Must be first
    base: ffi::sqlite3_vtab,
    sink: CsvSink,
}

pub(crate) fn module_error(err: impl Into<SinkError>) -> Error {
    Error::ModuleError(err.into().to_string())
}

unsafe impl<'vtab> VTab<'vtab> for CsvWriterTab {
    type Aux = ();
    type Cursor = WriteOnlyCursor;

    fn connect(
        db: &mut VTabConnection,
        _aux: Option<&()>,
        args: &[&[u8]],
    ) -> Result<(String, Self)> {
        let params = args
            .iter()
            .skip(RESERVED_ARGS)
            .map(|arg| std::str::from_utf8(arg))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::ModuleError(format!("csv_writer arguments must be UTF-8: {e}")))?;
        let config = SinkConfig::from_args(params).map_err(module_error)?;

        // Keeps a schema-controlled trigger or view from writing files.
        db.config(VTabConfig::DirectOnly)?;

        let sink = CsvSink::create(config).map_err(module_error)?;
        let schema = sink.schema_declaration();
        debug!(%schema, "declaring csv_writer table");

        Ok((
            schema,
            CsvWriterTab {
                base: ffi::sqlite3_vtab::default(),
                sink,
            },
        ))
    }

    fn best_index(&self, _info: &mut IndexInfo) -> Result<()> {
        Err(module_error(UnsupportedOperation::Select))
    }

    fn open(&'vtab mut self) -> Result<WriteOnlyCursor> {
        Ok(WriteOnlyCursor {
            base: ffi::sqlite3_vtab_cursor::default(),
        })
    }
}

impl<'vtab> CreateVTab<'vtab> for CsvWriterTab {
    const KIND: VTabKind = VTabKind::Default;

    fn destroy(&self) -> Result<()> {
        debug!(
            path = %self.sink.config().filename.display(),
            rows = self.sink.metrics().rows_written,
            "dropping csv_writer table"
        );
        Ok(())
    }
}

impl<'vtab> UpdateVTab<'vtab> for CsvWriterTab {
    fn delete(&mut self, _arg: ValueRef<'_>) -> Result<()> {
        Err(module_error(UnsupportedOperation::Delete))
    }

    fn insert(&mut self, args: &Values<'_>) -> Result<i64> {
        let row: Vec<Option<Cow<'_, [u8]>>> = args.iter().skip(ROWID_ARGS).map(value_text).collect();
        self.sink.insert_row(row).map_err(module_error)?;
        Ok(self.sink.metrics().rows_written as i64)
    }

    fn update(&mut self, _args: &Values<'_>) -> Result<()> {
        Err(module_error(UnsupportedOperation::Update))
    }
}

/// Never handed out in practice: planning any read fails in `best_index`.
#[repr(C)]
pub struct WriteOnlyCursor {
    /// Base class. Must be first
    base: ffi::sqlite3_vtab_cursor,
}

unsafe impl VTabCursor for WriteOnlyCursor {
    fn filter(&mut self, _idx_num: c_int, _idx_str: Option<&str>, _args: &Values<'_>) -> Result<()> {
        Err(module_error(UnsupportedOperation::Select))
    }

    fn next(&mut self) -> Result<()> {
        Err(module_error(UnsupportedOperation::Select))
    }

    fn eof(&self) -> bool {
        true
    }

    fn column(&self, _ctx: &mut Context, _i: c_int) -> Result<()> {
        Err(module_error(UnsupportedOperation::Select))
    }

    fn rowid(&self) -> Result<i64> {
        Err(module_error(UnsupportedOperation::Select))
    }
}

/// Renders a value the way `sqlite3_value_text` does. NULL stays absent;
/// text and blobs are passed through untouched.
pub fn value_text(value: ValueRef<'_>) -> Option<Cow<'_, [u8]>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Cow::Owned(i.to_string().into_bytes())),
        ValueRef::Real(f) => Some(Cow::Owned(real_text(f).into_bytes())),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(Cow::Borrowed(bytes)),
    }
}

/// Significant digits SQLite keeps when turning a REAL into text.
const REAL_DIGITS: usize = 15;

/// SQLite's `%!.15g`: 15 significant digits, trailing zeros dropped but at
/// least one digit after the point, exponent form outside `1e-4..1e15`.
fn real_text(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if f == 0.0 {
        return "0.0".to_string();
    }

    // `{:.14e}` yields the correctly rounded digits as `d.dddddddddddddde<exp>`
    let scientific = format!("{:.*e}", REAL_DIGITS - 1, f.abs());
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return f.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return f.to_string();
    };
    let digits = mantissa.replace('.', "");
    let digits = digits.trim_end_matches('0');
    let sign = if f < 0.0 { "-" } else { "" };

    if exp < -4 || exp >= REAL_DIGITS as i32 {
        let (lead, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{lead}.{rest}e{exp_sign}{:02}", exp.unsigned_abs());
    }

    if exp < 0 {
        let zeros = "0".repeat(exp.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }

    let int_len = exp as usize + 1;
    if digits.len() > int_len {
        let (int, frac) = digits.split_at(int_len);
        format!("{sign}{int}.{frac}")
    } else {
        let zeros = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{zeros}.0")
    }
}
