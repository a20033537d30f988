use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Data file '{path}' not found.")]
    NotFound { path: PathBuf },
    #[error("Failed to read data file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported data file extension '{ext}'. Use .jsonl, .ndjson or .json.")]
    UnsupportedExtension { ext: String },
    #[error("No valid request record found in '{path}'.")]
    Empty { path: PathBuf },
}
