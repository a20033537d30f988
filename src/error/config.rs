use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse line {line} of config '{path}': {source}")]
    ParseJsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .jsonl, .json or .toml.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have a .jsonl, .json or .toml extension.")]
    MissingExtension,
    #[error("Duplicate environment names in config: {conflicts}")]
    DuplicateEnvironment { conflicts: String },
    #[error("Environment '{env}' not found. Available environments: {available}")]
    UnknownEnvironment { env: String, available: String },
    #[error("Environment '{env}' is disabled.")]
    EnvironmentDisabled { env: String },
    #[error("Environment '{env}' is missing required field '{field}'.")]
    MissingField { env: String, field: &'static str },
    #[error("Environment '{env}' has an invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        env: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
}
