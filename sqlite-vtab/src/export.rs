use std::path::Path;

use csv_sink_core::schema::quote_identifier;
use csv_sink_core::ConfigError;
use rusqlite::{Connection, Result};
use tracing::{info, warn};

use crate::MODULE_NAME;
use crate::vtab::module_error;

/// Name of the scratch `csv_writer` table an export creates in `temp`.
const EXPORT_TABLE: &str = "csv_export";

/// Writes every row of `table` to `path` through a temporary `csv_writer`
/// table, header first. Returns the number of data rows written.
///
/// The `csv_writer` module must already be registered on `conn`.
pub fn export_table(conn: &Connection, table: &str, path: &Path, separator: char) -> Result<usize> {
    let source = quote_identifier(table);
    let columns = column_names(conn, &source)?;
    if let Some(name) = columns.iter().find(|name| name.contains(',')) {
        return Err(module_error(ConfigError::Invalid {
            message: format!("column {name:?} of {table} contains a comma and cannot be exported"),
        }));
    }

    let filename = path.to_str().ok_or_else(|| {
        module_error(ConfigError::Invalid {
            message: format!("output path {} is not valid UTF-8", path.display()),
        })
    })?;

    let target = format!("temp.{}", quote_identifier(EXPORT_TABLE));
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE {target} USING {MODULE_NAME}(filename={}, columns={}, separator={})",
        quote_literal(filename),
        quote_literal(&columns.join(",")),
        quote_literal(&separator.to_string()),
    ))?;

    let inserted = conn.execute(&format!("INSERT INTO {target} SELECT * FROM {source}"), []);
    let dropped = conn.execute_batch(&format!("DROP TABLE {target}"));

    let rows = inserted?;
    if let Err(e) = dropped {
        warn!(error = %e, "failed to drop export table");
        return Err(e);
    }

    info!(table, path = %path.display(), rows, "exported table");
    Ok(rows)
}

fn column_names(conn: &Connection, source: &str) -> Result<Vec<String>> {
    let stmt = conn.prepare(&format!("SELECT * FROM {source} LIMIT 0"))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
