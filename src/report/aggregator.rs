use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::percentile;
use crate::domain::{FailureKind, Outcome};

/// Status counted as a success in the summary.
pub const SUCCESS_STATUS: u16 = 200;
const MS_PER_MINUTE: f64 = 60_000.0;
const PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
struct Sample {
    status: u16,
    failure: Option<FailureKind>,
    duration_ms: f64,
}

/// Collects outcomes from every consumer. Appends take a short lock.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    samples: Mutex<Vec<Sample>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p80_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_requests: u64,
    pub status_code_counts: BTreeMap<u16, u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failure_counts: BTreeMap<FailureKind, u64>,
    pub success_count: u64,
    pub success_rate: f64,
    /// Absent when no outcome carried a positive duration.
    pub duration_stats: Option<LatencyStats>,
    /// `total / (max_ms / 60000)`; zero without duration stats.
    pub requests_per_minute: f64,
}

impl ReportAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &Outcome) {
        let sample = Sample {
            status: outcome.status,
            failure: outcome.failure,
            duration_ms: outcome.duration_ms,
        };
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn summarize(&self) -> Report {
        let samples = self
            .samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        summarize_samples(&samples)
    }
}

#[expect(clippy::float_arithmetic, reason = "success rate and rpm are ratios")]
fn summarize_samples(samples: &[Sample]) -> Report {
    let mut status_code_counts: BTreeMap<u16, u64> = BTreeMap::new();
    let mut failure_counts: BTreeMap<FailureKind, u64> = BTreeMap::new();
    let mut durations: Vec<f64> = Vec::with_capacity(samples.len());
    for sample in samples {
        let count = status_code_counts.entry(sample.status).or_insert(0);
        *count = count.saturating_add(1);
        if let Some(kind) = sample.failure {
            let failures = failure_counts.entry(kind).or_insert(0);
            *failures = failures.saturating_add(1);
        }
        if sample.duration_ms > 0.0 {
            durations.push(sample.duration_ms);
        }
    }

    let total_requests = u64::try_from(samples.len()).unwrap_or(u64::MAX);
    let success_count = status_code_counts
        .get(&SUCCESS_STATUS)
        .copied()
        .unwrap_or(0);
    let success_rate = if total_requests > 0 {
        success_count as f64 / total_requests as f64 * PERCENT
    } else {
        0.0
    };
    let duration_stats = latency_stats(&mut durations);
    let requests_per_minute = duration_stats
        .as_ref()
        .filter(|stats| stats.max_ms > 0.0)
        .map_or(0.0, |stats| {
            total_requests as f64 / (stats.max_ms / MS_PER_MINUTE)
        });

    Report {
        total_requests,
        status_code_counts,
        failure_counts,
        success_count,
        success_rate,
        duration_stats,
        requests_per_minute,
    }
}

#[expect(clippy::float_arithmetic, reason = "mean of millisecond samples")]
fn latency_stats(durations: &mut [f64]) -> Option<LatencyStats> {
    if durations.is_empty() {
        return None;
    }
    durations.sort_unstable_by(f64::total_cmp);
    let sum: f64 = durations.iter().sum();
    Some(LatencyStats {
        samples: durations.len(),
        min_ms: durations.first().copied().unwrap_or(0.0),
        max_ms: durations.last().copied().unwrap_or(0.0),
        avg_ms: sum / durations.len() as f64,
        p50_ms: percentile(durations, 50.0),
        p80_ms: percentile(durations, 80.0),
        p90_ms: percentile(durations, 90.0),
        p95_ms: percentile(durations, 95.0),
        p99_ms: percentile(durations, 99.0),
    })
}
