//! Outbound request path: rate limiting, client construction and dispatch.
mod client;
mod dispatch;
mod log;
mod rate;

#[cfg(test)]
mod tests;

pub use client::{CORRELATION_HEADER, build_client, build_headers};
pub use dispatch::{Dispatch, HttpDispatcher};
pub use rate::RateLimiter;
