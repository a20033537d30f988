//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod parsers;
mod resolve;
mod types;


pub use cli::{Command, LoadlineArgs, RewriteFieldArgs};
pub use types::{HttpMethod, LogMode, PositiveU64, PositiveUsize, ReadMode};

pub(crate) use defaults::DEFAULT_USER_AGENT;
