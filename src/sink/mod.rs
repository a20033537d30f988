//! Durable outcome storage: the buffered JSONL writer and plain JSON
//! document saves.
mod document;
mod writer;


pub use document::write_json_document;
pub use writer::{
    DEFAULT_FLUSH_COUNT, DEFAULT_FLUSH_INTERVAL, DEFAULT_IDLE_WAIT, DEFAULT_QUEUE_CAPACITY,
    OutcomeSink, SinkConfig, SinkHandle, SinkStats,
};
