use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use super::client::CORRELATION_HEADER;
use super::log::{log_outcome, log_request};
use super::rate::RateLimiter;
use crate::args::{HttpMethod, LogMode};
use crate::domain::{FailureKind, Outcome, RequestRecord};

/// Turns one record into exactly one [`Outcome`].
///
/// Implementations never fail: transport problems are folded into the
/// returned outcome.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn send(&self, record: RequestRecord) -> Outcome;
}

pub struct HttpDispatcher {
    client: Client,
    url: Url,
    method: HttpMethod,
    headers: HeaderMap,
    limiter: Arc<RateLimiter>,
    log_mode: LogMode,
}

impl HttpDispatcher {
    #[must_use]
    pub const fn new(
        client: Client,
        url: Url,
        method: HttpMethod,
        headers: HeaderMap,
        limiter: Arc<RateLimiter>,
        log_mode: LogMode,
    ) -> Self {
        Self {
            client,
            url,
            method,
            headers,
            limiter,
            log_mode,
        }
    }

    fn request_headers(&self, correlation_id: &str) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Ok(value) = HeaderValue::from_str(correlation_id) {
            headers.insert(HeaderName::from_static(CORRELATION_HEADER), value);
        }
        headers
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    async fn send(&self, record: RequestRecord) -> Outcome {
        let correlation_id = mint_correlation_id();
        let method = Method::from(self.method);
        let headers = self.request_headers(&correlation_id);
        let body = self.method.carries_body().then_some(&record.payload);
        log_request(
            self.log_mode,
            &correlation_id,
            &method,
            self.url.as_str(),
            &headers,
            body,
        );

        let mut request = self
            .client
            .request(method, self.url.clone())
            .headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.limiter.acquire().await;
        let started = Instant::now();
        let outcome = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let response_headers = capture_headers(response.headers());
                match read_body(response).await {
                    Ok(body) => Outcome::response(
                        record.sequence,
                        correlation_id,
                        status,
                        body,
                        response_headers,
                        elapsed_ms(started),
                    ),
                    Err(err) => transport_failure(record.sequence, correlation_id, &err),
                }
            }
            Err(err) => transport_failure(record.sequence, correlation_id, &err),
        };
        log_outcome(self.log_mode, &outcome);
        outcome
    }
}

/// UUIDv4 as 32 lowercase hex chars.
pub(super) fn mint_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn transport_failure(sequence: u64, correlation_id: String, err: &reqwest::Error) -> Outcome {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    };
    Outcome::failed(sequence, correlation_id, kind, error_chain(err))
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn capture_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

async fn read_body(response: Response) -> Result<Value, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut raw: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        raw.extend_from_slice(&chunk?);
    }
    Ok(decode_body(&raw))
}

/// JSON when the payload parses, otherwise the text as a JSON string.
pub(super) fn decode_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw)
        .unwrap_or_else(|_err| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

#[expect(clippy::float_arithmetic, reason = "fractional milliseconds")]
fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
