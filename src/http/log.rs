use std::collections::BTreeMap;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::Value;
use tracing::{error, info};

use crate::args::LogMode;
use crate::domain::Outcome;

/// Longest string value printed in `partial` mode before it is cut.
const PARTIAL_MAX_CHARS: usize = 200;
const SIMPLE_RESPONSE_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
];

pub(super) fn log_request(
    mode: LogMode,
    correlation_id: &str,
    method: &reqwest::Method,
    url: &str,
    headers: &HeaderMap,
    body: Option<&Value>,
) {
    if !mode.logs_exchange() {
        return;
    }
    info!("[{}] {} {}", correlation_id, method, url);
    info!(
        "[{}] request headers: {}",
        correlation_id,
        render_headers(&masked_headers(headers))
    );
    if let Some(body) = body {
        info!(
            "[{}] request body: {}",
            correlation_id,
            render_value(mode, body)
        );
    }
}

pub(super) fn log_outcome(mode: LogMode, outcome: &Outcome) {
    match mode {
        LogMode::None => {}
        LogMode::Error => {
            if let Some(kind) = outcome.failure {
                error!(
                    "[{}] {} failure: {}",
                    outcome.correlation_id,
                    kind.as_str(),
                    render_value(LogMode::Full, &outcome.body)
                );
            }
        }
        LogMode::Simple => {
            info!("[{}] {}", outcome.correlation_id, simple_summary(outcome));
        }
        LogMode::Partial | LogMode::Full => {
            if let Some(kind) = outcome.failure {
                error!(
                    "[{}] {} failure: {}",
                    outcome.correlation_id,
                    kind.as_str(),
                    render_value(mode, &outcome.body)
                );
                return;
            }
            info!(
                "[{}] response status: {} ({:.2}ms)",
                outcome.correlation_id, outcome.status, outcome.duration_ms
            );
            info!(
                "[{}] response headers: {}",
                outcome.correlation_id,
                render_headers(&outcome.headers)
            );
            info!(
                "[{}] response body: {}",
                outcome.correlation_id,
                render_value(mode, &outcome.body)
            );
        }
    }
}

/// One-line `HTTP <status> | Usage: {...} | Headers: ...` summary.
pub(super) fn simple_summary(outcome: &Outcome) -> String {
    let mut line = match outcome.failure {
        Some(kind) => format!("HTTP {} ({})", outcome.status, kind.as_str()),
        None => format!("HTTP {}", outcome.status),
    };
    if let Some(usage) = outcome.body.get("usage") {
        line.push_str(" | Usage: ");
        line.push_str(&usage.to_string());
    }
    let key_headers: Vec<String> = SIMPLE_RESPONSE_HEADERS
        .iter()
        .filter_map(|key| {
            outcome
                .headers
                .get(*key)
                .map(|value| format!("{}: {}", key, value))
        })
        .collect();
    if !key_headers.is_empty() {
        line.push_str(" | Headers: ");
        line.push_str(&key_headers.join(", "));
    }
    line
}

pub(super) fn masked_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = if name == AUTHORIZATION {
                mask_credential(value.to_str().unwrap_or_default())
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_owned(), rendered)
        })
        .collect()
}

fn mask_credential(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _secret)) => format!("{} ****", scheme),
        None => "****".to_owned(),
    }
}

fn render_headers(headers: &BTreeMap<String, String>) -> String {
    serde_json::to_string(headers).unwrap_or_default()
}

fn render_value(mode: LogMode, value: &Value) -> String {
    let rendered = if matches!(mode, LogMode::Partial) {
        truncate_strings(value, PARTIAL_MAX_CHARS).to_string()
    } else {
        value.to_string()
    };
    rendered.replace(['\n', '\r'], " ")
}

/// Copies `value`, cutting every string longer than `max_chars` and noting
/// the original length.
pub(super) fn truncate_strings(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(text) => {
            let total = text.chars().count();
            if total > max_chars {
                let head: String = text.chars().take(max_chars).collect();
                Value::String(format!("{}... ({} chars)", head, total))
            } else {
                value.clone()
            }
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| truncate_strings(item, max_chars))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), truncate_strings(item, max_chars)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}
