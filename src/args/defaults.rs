pub(crate) const DEFAULT_RATE: &str = "1";
pub(crate) const DEFAULT_TIMEOUT: &str = "60s";
pub(crate) const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "./data";
pub(crate) const DEFAULT_SINK_BUFFER: &str = "20";
pub(crate) const DEFAULT_FLUSH_COUNT: &str = "10";
pub(crate) const DEFAULT_FLUSH_INTERVAL: &str = "1";
pub(crate) const DEFAULT_REWRITE_FIELD: &str = "model";
pub(crate) const DEFAULT_FIELD_VALUE: &str = "doubao";

/// Streamed results land here, under `--output-dir`.
pub(crate) const STREAM_OUTPUT_FILE: &str = "data.jsonl";
/// A lone `--request-body` result lands here when there is no `--data`.
pub(crate) const SINGLE_OUTPUT_FILE: &str = "data.json";

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("loadline/", env!("CARGO_PKG_VERSION"));
