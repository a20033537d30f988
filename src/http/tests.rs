use super::dispatch::{decode_body, mint_correlation_id};
use super::log::{masked_headers, simple_summary, truncate_strings};
use super::*;
use crate::args::{HttpMethod, LogMode};
use crate::domain::{FailureKind, Outcome, RequestRecord, TRANSPORT_FAILURE_STATUS};
use crate::test_support::{ServerReply, run_async_test, spawn_http_server};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn dispatcher(url: &str, method: HttpMethod, timeout: Duration) -> Result<HttpDispatcher, String> {
    let client = build_client(timeout, Duration::from_secs(1)).map_err(|err| err.to_string())?;
    let headers = build_headers(&[], "secret-key").map_err(|err| err.to_string())?;
    let limiter = RateLimiter::per_second(1000.0).map_err(|err| err.to_string())?;
    let url = url::Url::parse(url).map_err(|err| err.to_string())?;
    Ok(HttpDispatcher::new(
        client,
        url,
        method,
        headers,
        Arc::new(limiter),
        LogMode::None,
    ))
}

#[test]
fn rate_limiter_rejects_non_positive_rates() -> Result<(), String> {
    run_async_test(async {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            if RateLimiter::per_second(rate).is_ok() {
                return Err(format!("Expected rate {} to be rejected", rate));
            }
        }
        Ok(())
    })
}

#[test]
fn rate_limiter_spaces_permits_uniformly() -> Result<(), String> {
    run_async_test(async {
        let limiter = RateLimiter::per_second(20.0).map_err(|err| err.to_string())?;
        if limiter.period() != Duration::from_millis(50) {
            return Err(format!("Unexpected period {:?}", limiter.period()));
        }
        let started = Instant::now();
        for _ in 0..11 {
            limiter.acquire().await;
        }
        let elapsed = started.elapsed();
        // First permit is immediate, the next ten are 50ms apart.
        if elapsed < Duration::from_millis(450) {
            return Err(format!("Permits issued too fast: {:?}", elapsed));
        }
        Ok(())
    })
}

#[test]
fn rate_limiter_does_not_bank_idle_time() -> Result<(), String> {
    run_async_test(async {
        let limiter = RateLimiter::per_second(10.0).map_err(|err| err.to_string())?;
        tokio::time::sleep(Duration::from_millis(350)).await;
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // One stored permit at most, so two more ticks must pass.
        if started.elapsed() < Duration::from_millis(140) {
            return Err(format!(
                "Idle time was banked into a burst: {:?}",
                started.elapsed()
            ));
        }
        Ok(())
    })
}

#[test]
fn hundred_permits_at_ten_per_second_take_nine_seconds() -> Result<(), String> {
    run_async_test(async {
        let limiter = RateLimiter::per_second(10.0).map_err(|err| err.to_string())?;
        let started = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        if started.elapsed() < Duration::from_secs(9) {
            return Err(format!("Elapsed {:?}, expected >= 9s", started.elapsed()));
        }
        Ok(())
    })
}

#[test]
fn build_headers_defaults_content_type_and_sets_bearer() -> Result<(), String> {
    let headers = build_headers(&[], "abc").map_err(|err| err.to_string())?;
    if headers.get(CONTENT_TYPE).map(|value| value.as_bytes()) != Some(b"application/json".as_slice()) {
        return Err("Expected default JSON content type".to_owned());
    }
    if headers.get(AUTHORIZATION).map(|value| value.as_bytes()) != Some(b"Bearer abc".as_slice()) {
        return Err("Expected bearer authorization".to_owned());
    }
    Ok(())
}

#[test]
fn build_headers_user_authorization_is_replaced() -> Result<(), String> {
    let user = vec![
        ("Authorization".to_owned(), "Basic zzz".to_owned()),
        ("X-Trace".to_owned(), "on".to_owned()),
    ];
    let headers = build_headers(&user, "abc").map_err(|err| err.to_string())?;
    if headers.get_all(AUTHORIZATION).iter().count() != 1 {
        return Err("Expected exactly one authorization header".to_owned());
    }
    if headers.get(AUTHORIZATION).map(|value| value.as_bytes()) != Some(b"Bearer abc".as_slice()) {
        return Err("User authorization should be replaced".to_owned());
    }
    if headers.contains_key(CONTENT_TYPE) {
        return Err("No default content type expected with user headers".to_owned());
    }
    Ok(())
}

#[test]
fn build_headers_rejects_invalid_name() -> Result<(), String> {
    let user = vec![("bad header".to_owned(), "x".to_owned())];
    if build_headers(&user, "abc").is_ok() {
        return Err("Expected invalid header name error".to_owned());
    }
    Ok(())
}

#[test]
fn correlation_ids_are_unique_hex() -> Result<(), String> {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let id = mint_correlation_id();
        if id.len() != 32 || !id.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("Unexpected correlation id format: {}", id));
        }
        if !seen.insert(id) {
            return Err("Duplicate correlation id".to_owned());
        }
    }
    Ok(())
}

#[test]
fn dispatch_posts_record_with_auth_and_correlation() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_http_server(ServerReply::json(
            200,
            r#"{"id":"r1","usage":{"total_tokens":3}}"#,
        ))
        .await?;
        let dispatcher = dispatcher(&server.url, HttpMethod::Post, TEST_TIMEOUT)?;
        let outcome = dispatcher
            .send(RequestRecord::new(4, json!({"prompt": "hi"})))
            .await;

        if outcome.status != 200 || outcome.failure.is_some() {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.sequence_number != 4 {
            return Err(format!("Unexpected sequence {}", outcome.sequence_number));
        }
        if outcome.body.get("id") != Some(&json!("r1")) {
            return Err(format!("Body not parsed as JSON: {}", outcome.body));
        }
        if outcome.duration_ms <= 0.0 {
            return Err("Expected a measured duration".to_owned());
        }
        if outcome.headers.get("content-type").map(String::as_str) != Some("application/json") {
            return Err(format!("Response headers missing: {:?}", outcome.headers));
        }

        let captured = server.captured()?;
        let request = captured.first().ok_or("No request captured")?;
        if !request.head.starts_with("POST /v1/chat") {
            return Err(format!("Unexpected request line: {}", request.head));
        }
        if request.header("authorization").as_deref() != Some("Bearer secret-key") {
            return Err("Missing bearer header".to_owned());
        }
        if request.header(CORRELATION_HEADER).as_deref() != Some(outcome.correlation_id.as_str()) {
            return Err("Correlation header does not match outcome".to_owned());
        }
        let sent: serde_json::Value =
            serde_json::from_str(&request.body).map_err(|err| err.to_string())?;
        if sent != json!({"prompt": "hi"}) {
            return Err(format!("Unexpected body sent: {}", request.body));
        }
        Ok(())
    })
}

#[test]
fn dispatch_get_sends_no_body() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_http_server(ServerReply::json(200, "ok")).await?;
        let dispatcher = dispatcher(&server.url, HttpMethod::Get, TEST_TIMEOUT)?;
        let outcome = dispatcher
            .send(RequestRecord::new(1, json!({"prompt": "hi"})))
            .await;
        if outcome.body != json!("ok") {
            return Err(format!("Text body expected, got {}", outcome.body));
        }
        let captured = server.captured()?;
        let request = captured.first().ok_or("No request captured")?;
        if !request.body.is_empty() {
            return Err(format!("GET carried a body: {}", request.body));
        }
        Ok(())
    })
}

#[test]
fn server_error_is_a_normal_outcome() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_http_server(ServerReply::json(503, r#"{"error":"busy"}"#)).await?;
        let dispatcher = dispatcher(&server.url, HttpMethod::Post, TEST_TIMEOUT)?;
        let outcome = dispatcher.send(RequestRecord::new(1, json!({}))).await;
        if outcome.status != 503 || outcome.failure.is_some() {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.body.get("error") != Some(&json!("busy")) {
            return Err("Server body should be preserved".to_owned());
        }
        Ok(())
    })
}

#[test]
fn connection_refused_becomes_transport_failure() -> Result<(), String> {
    run_async_test(async {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
        let addr = listener.local_addr().map_err(|err| err.to_string())?;
        drop(listener);

        let url = format!("http://{}/", addr);
        let dispatcher = dispatcher(&url, HttpMethod::Post, TEST_TIMEOUT)?;
        let outcome = dispatcher.send(RequestRecord::new(9, json!({}))).await;
        if outcome.status != TRANSPORT_FAILURE_STATUS {
            return Err(format!("Unexpected status {}", outcome.status));
        }
        if outcome.failure != Some(FailureKind::Transport) {
            return Err(format!("Unexpected failure {:?}", outcome.failure));
        }
        if outcome.duration_ms.abs() > f64::EPSILON {
            return Err("Failed attempt must report zero duration".to_owned());
        }
        if !outcome.body.is_string() {
            return Err("Failure body should carry the error text".to_owned());
        }
        Ok(())
    })
}

#[test]
fn slow_server_becomes_timeout_failure() -> Result<(), String> {
    run_async_test(async {
        let mut reply = ServerReply::json(200, "{}");
        reply.delay = Duration::from_millis(500);
        let server = spawn_http_server(reply).await?;
        let dispatcher = dispatcher(&server.url, HttpMethod::Post, Duration::from_millis(100))?;
        let outcome = dispatcher.send(RequestRecord::new(1, json!({}))).await;
        if outcome.failure != Some(FailureKind::Timeout) {
            return Err(format!("Expected timeout, got {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn decode_body_falls_back_to_text() -> Result<(), String> {
    if decode_body(br#"{"a":1}"#) != json!({"a": 1}) {
        return Err("JSON body should parse".to_owned());
    }
    if decode_body(b"plain text") != json!("plain text") {
        return Err("Text body should be kept as string".to_owned());
    }
    Ok(())
}

#[test]
fn partial_truncation_cuts_long_strings_only() -> Result<(), String> {
    let long = "x".repeat(250);
    let value = json!({"short": "abc", "nested": [{"long": long}], "n": 3});
    let truncated = truncate_strings(&value, 200);
    let cut = truncated
        .pointer("/nested/0/long")
        .and_then(|value| value.as_str())
        .ok_or("Missing nested value")?;
    if !cut.ends_with("... (250 chars)") || cut.chars().count() != 200 + "... (250 chars)".len() {
        return Err(format!("Unexpected truncation: {}", cut));
    }
    if truncated.get("short") != Some(&json!("abc")) || truncated.get("n") != Some(&json!(3)) {
        return Err("Short values must be unchanged".to_owned());
    }
    Ok(())
}

#[test]
fn authorization_is_masked_in_logs() -> Result<(), String> {
    let headers = build_headers(&[], "top-secret").map_err(|err| err.to_string())?;
    let masked = masked_headers(&headers);
    let auth = masked.get("authorization").ok_or("Missing authorization")?;
    if auth.contains("top-secret") {
        return Err("Credential leaked into log output".to_owned());
    }
    Ok(())
}

#[test]
fn simple_summary_includes_usage_and_key_headers() -> Result<(), String> {
    let headers = BTreeMap::from([
        ("content-type".to_owned(), "application/json".to_owned()),
        ("x-other".to_owned(), "skip".to_owned()),
    ]);
    let outcome = Outcome::response(
        1,
        "id".to_owned(),
        200,
        json!({"usage": {"total_tokens": 5}}),
        headers,
        1.0,
    );
    let line = simple_summary(&outcome);
    if line != r#"HTTP 200 | Usage: {"total_tokens":5} | Headers: content-type: application/json"# {
        return Err(format!("Unexpected summary: {}", line));
    }
    Ok(())
}
