use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status recorded when the request never got a response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Connection refused, DNS failure, reset, body read error.
    Transport,
    /// Connect or request timeout.
    Timeout,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
        }
    }
}

/// Terminal result of one dispatch attempt.
///
/// A server error response is a regular outcome with its real status and
/// `failure == None`; only attempts that never produced a response carry a
/// `failure` tag, `status == TRANSPORT_FAILURE_STATUS` and `duration_ms == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub sequence_number: u64,
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<usize>,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub body: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub duration_ms: f64,
    pub completed_at: DateTime<Utc>,
}

impl Outcome {
    #[must_use]
    pub fn response(
        sequence_number: u64,
        correlation_id: String,
        status: u16,
        body: Value,
        headers: BTreeMap<String, String>,
        duration_ms: f64,
    ) -> Self {
        Self {
            sequence_number,
            correlation_id,
            worker_id: None,
            status,
            failure: None,
            body,
            headers,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(
        sequence_number: u64,
        correlation_id: String,
        kind: FailureKind,
        message: String,
    ) -> Self {
        Self {
            sequence_number,
            correlation_id,
            worker_id: None,
            status: TRANSPORT_FAILURE_STATUS,
            failure: Some(kind),
            body: Value::String(message),
            headers: BTreeMap::new(),
            duration_ms: 0.0,
            completed_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn with_worker(mut self, worker_id: usize) -> Self {
        self.worker_id = Some(worker_id);
        self
    }
}
