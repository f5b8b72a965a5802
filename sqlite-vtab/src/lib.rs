//! SQLite integration for `csv-sink-core`.
//!
//! Nothing is registered implicitly: call [`register_module`] on each
//! connection that should be able to create `csv_writer` tables.

pub mod export;
pub mod vtab;

use rusqlite::Connection;
use rusqlite::vtab::update_module;

pub use export::export_table;
pub use vtab::CsvWriterTab;

pub const MODULE_NAME: &str = "csv_writer";

pub fn register_module(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_module(MODULE_NAME, update_module::<CsvWriterTab>(), None)
}
