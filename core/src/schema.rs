//! Column registry derived from the `columns` table parameter.

use std::fmt::Write as _;

/// Ordered column names. Position in this list is the field position in
/// every emitted record and in the declared schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns(Vec<String>);

impl Columns {
    /// Splits on every `,`. Empty segments are kept as empty names, so
    /// `",b"` yields `["", "b"]` and `""` yields a single empty name.
    pub fn parse(raw: &str) -> Self {
        Columns(raw.split(',').map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// `CREATE TABLE x("a" TEXT, "b" TEXT)`, the statement handed to the
    /// host to declare the table's shape.
    pub fn schema_declaration(&self) -> String {
        let mut sql = String::from("CREATE TABLE x(");
        for (i, name) in self.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "{} TEXT", quote_identifier(name));
        }
        sql.push(')');
        sql
    }
}

/// Wraps `name` in double quotes, doubling any it contains.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
