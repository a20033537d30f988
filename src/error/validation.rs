use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header name '{header}': {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid value for header '{header}': {source}")]
    InvalidHeaderValue {
        header: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid rate '{value}'. Expected a positive number of requests per second.")]
    InvalidRate { value: String },
    #[error("Invalid flush interval '{value}'. Expected seconds as a non-negative number.")]
    InvalidFlushInterval { value: String },
    #[error("Read mode '{mode}' requires --count.")]
    CountRequired { mode: &'static str },
    #[error("--start-line ({start}) must not be greater than --end-line ({end}).")]
    LineRangeInverted { start: u64, end: u64 },
    #[error("--start-line/--end-line are only valid with --read-mode full.")]
    LineRangeRequiresFullMode,
    #[error("Missing --env (required to dispatch requests).")]
    MissingEnv,
    #[error("Missing --config (required to dispatch requests).")]
    MissingConfig,
    #[error("Nothing to send: provide --data and/or --request-body.")]
    NothingToSend,
}
