use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, HttpError, ValidationError};

/// Per-request header carrying the correlation id (`X-Client-Request-ID`).
pub const CORRELATION_HEADER: &str = "x-client-request-id";

/// Builds the shared HTTP client used by every consumer.
///
/// # Errors
///
/// Returns an error when the TLS backend cannot be initialised.
pub fn build_client(request_timeout: Duration, connect_timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}

/// Builds the base header set sent with every request.
///
/// With no user headers, `Content-Type: application/json` is the default.
/// `Authorization: Bearer <credential>` always replaces any user value.
///
/// # Errors
///
/// Returns an error when a header name or value is not valid HTTP.
pub fn build_headers(user_headers: &[(String, String)], credential: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if user_headers.is_empty() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    for (key, value) in user_headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            AppError::validation(ValidationError::InvalidHeaderName {
                header: key.clone(),
                source: err,
            })
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            AppError::validation(ValidationError::InvalidHeaderValue {
                header: key.clone(),
                source: err,
            })
        })?;
        headers.append(name, header_value);
    }

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential)).map_err(|err| {
        AppError::validation(ValidationError::InvalidHeaderValue {
            header: AUTHORIZATION.as_str().to_owned(),
            source: err,
        })
    })?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}
