//! Core library for the `loadline` CLI.
//!
//! The binary replays JSON request records against an HTTP endpoint at a
//! fixed rate: a [`source::StreamSource`] feeds a bounded [`pipeline`],
//! consumers dispatch through [`http::HttpDispatcher`], every
//! [`domain::Outcome`] is appended to a JSON-lines [`sink`] and folded into a
//! [`report`]. Library APIs follow the needs of the CLI and may change with
//! it.
pub mod args;
pub mod config;
pub mod domain;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod pipeline;
pub mod report;
pub mod rewrite;
pub mod shutdown;
pub mod sink;
pub mod source;

mod app;

#[cfg(test)]
pub(crate) mod test_support;
