use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FIELD_VALUE, DEFAULT_OUTPUT_DIR, DEFAULT_RATE,
    DEFAULT_REWRITE_FIELD, DEFAULT_SINK_BUFFER, DEFAULT_FLUSH_COUNT, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_TIMEOUT,
};
use super::parsers::{
    parse_duration_arg, parse_flush_interval, parse_header, parse_positive_u64,
    parse_positive_usize, parse_rate,
};
use super::types::{HttpMethod, LogMode, PositiveU64, PositiveUsize, ReadMode};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Rewrite one top-level field across a JSON-lines file
    RewriteField(RewriteFieldArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RewriteFieldArgs {
    /// Source JSON-lines file
    #[arg(long = "input", alias = "input-file")]
    pub input: PathBuf,

    /// Destination file (overwritten)
    #[arg(long = "output", alias = "output-file")]
    pub output: PathBuf,

    /// Top-level field to set
    #[arg(long = "field", default_value = DEFAULT_REWRITE_FIELD)]
    pub field: String,

    /// New value for the field
    #[arg(long = "value", alias = "new-model", default_value = DEFAULT_FIELD_VALUE)]
    pub value: String,

    /// First line to rewrite (1-based, inclusive)
    #[arg(long = "start-line", value_parser = parse_positive_u64)]
    pub start_line: Option<PositiveU64>,

    /// Last line to rewrite (1-based, inclusive)
    #[arg(long = "end-line", value_parser = parse_positive_u64)]
    pub end_line: Option<PositiveU64>,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rate-limited JSON request replayer for HTTP inference endpoints, with streaming result capture and latency reports."
)]
pub struct LoadlineArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Environment name to look up in the config file
    #[arg(long = "env", short = 'e')]
    pub env: Option<String>,

    /// Environment config file (.jsonl, .json or .toml)
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Credential override for the selected environment
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// List the environments in --config and exit
    #[arg(long = "list-envs", short = 'l')]
    pub list_envs: bool,

    /// Request records to replay (.jsonl, .ndjson or .json)
    #[arg(long = "data", short = 'd', alias = "concurrent-bodies")]
    pub data: Option<PathBuf>,

    /// Send the first record of this file once before the main run
    #[arg(long = "request-body", short = 'b')]
    pub request_body: Option<PathBuf>,

    /// Which records to take from --data
    #[arg(long = "read-mode", value_enum, default_value_t = ReadMode::Full)]
    pub read_mode: ReadMode,

    /// Record count for first-n, random-n and exact-count
    #[arg(long = "count", value_parser = parse_positive_usize)]
    pub count: Option<PositiveUsize>,

    /// First line to send in full mode (1-based, inclusive)
    #[arg(long = "start-line", value_parser = parse_positive_u64)]
    pub start_line: Option<PositiveU64>,

    /// Last line to send in full mode (1-based, inclusive)
    #[arg(long = "end-line", value_parser = parse_positive_u64)]
    pub end_line: Option<PositiveU64>,

    /// Do not pad exact-count runs with copies of the first record
    #[arg(long = "no-fill")]
    pub no_fill: bool,

    /// Seed for random-n sampling
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Maximum requests per second
    #[arg(
        long = "rate",
        short = 'r',
        alias = "concurrent-rate-limit",
        default_value = DEFAULT_RATE,
        value_parser = parse_rate
    )]
    pub rate: f64,

    /// Number of dispatching workers
    #[arg(long = "workers", short = 'w', default_value = "1", value_parser = parse_positive_usize)]
    pub workers: PositiveUsize,

    /// Request queue capacity (defaults to 10x the rate)
    #[arg(long = "buffer", value_parser = parse_positive_usize)]
    pub buffer: Option<PositiveUsize>,

    /// HTTP method to use
    #[arg(long, short = 'X', value_enum, default_value_t = HttpMethod::Post, ignore_case = true)]
    pub method: HttpMethod,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = DEFAULT_TIMEOUT, value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Connect timeout (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        default_value = DEFAULT_CONNECT_TIMEOUT,
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Per-request log detail
    #[arg(long = "log-mode", value_enum, default_value_t = LogMode::Partial)]
    pub log_mode: LogMode,

    /// Directory for data.jsonl / data.json
    #[arg(long = "output-dir", short = 'o', default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Result writer queue capacity
    #[arg(long = "sink-buffer", default_value = DEFAULT_SINK_BUFFER, value_parser = parse_positive_usize)]
    pub sink_buffer: PositiveUsize,

    /// Flush after this many written results (0 disables)
    #[arg(long = "flush-count", default_value = DEFAULT_FLUSH_COUNT)]
    pub flush_count: usize,

    /// Flush after this many seconds (0 disables)
    #[arg(long = "flush-interval", default_value = DEFAULT_FLUSH_INTERVAL, value_parser = parse_flush_interval)]
    pub flush_interval: Duration,

    /// Also save the final report as pretty JSON
    #[arg(long = "report-json")]
    pub report_json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
