//! Request sources: lazy file readers and the selection policies applied
//! on top of them.
mod reader;
mod select;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::domain::RequestRecord;
use crate::error::AppResult;

pub use reader::{LineRange, RecordReader, SourceFormat};
pub use select::{Selection, StreamSource};

/// A finite, forward-only sequence of request records.
#[async_trait]
pub trait RecordStream: Send {
    /// Returns the next record, or `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    async fn next_record(&mut self) -> AppResult<Option<RequestRecord>>;
}
