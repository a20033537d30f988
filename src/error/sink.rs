use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open output '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to {context} '{path}': {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize outcome: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("Output writer is closed.")]
    Closed,
    #[error("Output writer task failed: {source}")]
    WriterPanicked {
        #[source]
        source: tokio::task::JoinError,
    },
}
