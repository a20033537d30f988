use super::Report;

const SUMMARY_PREFIX: &str = "REPORT_SUMMARY";

/// Single machine-readable line:
/// `REPORT_SUMMARY total=N <status>=<count>... min= max= avg= p50= p80= p90= p95= p99= rpm=`.
/// Latency fields and `rpm` are omitted when no duration was measured.
#[must_use]
pub fn summary_line(report: &Report) -> String {
    let mut items = vec![format!("total={}", report.total_requests)];
    items.extend(
        report
            .status_code_counts
            .iter()
            .map(|(status, count)| format!("{}={}", status, count)),
    );
    if let Some(stats) = report.duration_stats.as_ref() {
        items.extend([
            format!("min={:.2}", stats.min_ms),
            format!("max={:.2}", stats.max_ms),
            format!("avg={:.2}", stats.avg_ms),
            format!("p50={:.2}", stats.p50_ms),
            format!("p80={:.2}", stats.p80_ms),
            format!("p90={:.2}", stats.p90_ms),
            format!("p95={:.2}", stats.p95_ms),
            format!("p99={:.2}", stats.p99_ms),
            format!("rpm={:.2}", report.requests_per_minute),
        ]);
    }
    format!("{} {}", SUMMARY_PREFIX, items.join(" "))
}

#[must_use]
pub fn summary_lines(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Total Requests: {}", report.total_requests));
    lines.push(format!(
        "Successful: {} ({:.1}%)",
        report.success_count, report.success_rate
    ));
    for (status, count) in &report.status_code_counts {
        lines.push(format!("Status {}: {}", status, count));
    }
    for (kind, count) in &report.failure_counts {
        lines.push(format!("Failed ({}): {}", kind.as_str(), count));
    }
    match report.duration_stats.as_ref() {
        Some(stats) => {
            lines.push(format!(
                "Min/Avg/Max Latency: {:.1}ms / {:.1}ms / {:.1}ms",
                stats.min_ms, stats.avg_ms, stats.max_ms
            ));
            lines.push(format!(
                "P50/P80/P90/P95/P99 Latency: {:.1}ms / {:.1}ms / {:.1}ms / {:.1}ms / {:.1}ms",
                stats.p50_ms, stats.p80_ms, stats.p90_ms, stats.p95_ms, stats.p99_ms
            ));
            lines.push(format!("Throughput: {:.2} req/min", report.requests_per_minute));
        }
        None => lines.push("Latency: no completed requests".to_owned()),
    }
    lines
}
