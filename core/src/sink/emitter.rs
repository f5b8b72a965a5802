//! Record encoding: field separation, quoting and the line terminator.

/// Every record ends with CR LF on every platform.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

const QUOTE: u8 = b'"';

/// Bytes that force a field to be quoted, indexed by byte value. The
/// separator is checked separately since it is configurable.
#[rustfmt::skip]
static NEEDS_QUOTE: [bool; 256] = {
    const T: bool = true;
    const F: bool = false;
    [
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, F, T, F, F, F, F, T,   F, F, F, F, F, F, F, F,
        F, F, F, F, F, F, F, F,   F, F, F, F, F, F, F, F,
        F, F, F, F, F, F, F, F,   F, F, F, F, F, F, F, F,
        F, F, F, F, F, F, F, F,   F, F, F, F, F, F, F, F,
        F, F, F, F, F, F, F, F,   F, F, F, F, F, F, F, F,
        F, F, F, F, F, F, F, F,   F, F, F, F, F, F, F, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
        T, T, T, T, T, T, T, T,   T, T, T, T, T, T, T, T,
    ]
};

/// Outcome of encoding one record, fed into the sink's metrics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub fields: usize,
    pub null_fields: usize,
    pub quoted_fields: usize,
}

/// Encodes records for a fixed separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowEmitter {
    separator: u8,
}

impl RowEmitter {
    pub fn new(separator: u8) -> Self {
        Self { separator }
    }

    pub fn needs_quoting(&self, field: &[u8]) -> bool {
        field
            .iter()
            .any(|&b| b == self.separator || NEEDS_QUOTE[b as usize])
    }

    /// Appends one field to `out`. Returns whether it was quoted.
    pub fn encode_field(&self, field: &[u8], out: &mut Vec<u8>) -> bool {
        if !self.needs_quoting(field) {
            out.extend_from_slice(field);
            return false;
        }

        out.reserve(field.len() + 2);
        out.push(QUOTE);
        for &b in field {
            if b == QUOTE {
                out.push(QUOTE);
            }
            out.push(b);
        }
        out.push(QUOTE);
        true
    }

    /// Appends a complete record, terminator included, to `out`. A `None`
    /// field is written as nothing at all, the same bytes as an empty string.
    pub fn encode_record<I, F>(&self, fields: I, out: &mut Vec<u8>) -> RecordStats
    where
        I: IntoIterator<Item = Option<F>>,
        F: AsRef<[u8]>,
    {
        let mut stats = RecordStats::default();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            stats.fields += 1;
            match field {
                Some(value) => {
                    if self.encode_field(value.as_ref(), out) {
                        stats.quoted_fields += 1;
                    }
                }
                None => stats.null_fields += 1,
            }
        }
        out.extend_from_slice(LINE_TERMINATOR);
        stats
    }
}
