pub mod emitter;
pub mod writer;

use crate::errors::Result;

/// Lifecycle of a sink. A sink that failed to open never exists, so there is
/// no unopened state to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Open,
    Closed,
}

/// The `Sink` trait is the contract a host drives: open once, insert any
/// number of rows, close once.
pub trait Sink: Sized {
    type Config;

    /// Opens the output and writes anything that must precede the first row.
    fn open(config: Self::Config) -> Result<Self>;

    /// Writes one row. Fields are positional and `None` is SQL NULL.
    fn insert_row<I, F>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<F>>,
        F: AsRef<[u8]>;

    /// Flushes and releases the output. Calling it again does nothing.
    fn close(&mut self) -> Result<()>;

    fn state(&self) -> SinkState;
}
