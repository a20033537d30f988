use std::path::Path;

use tracing::info;

use super::runner::RunOutcome;
use crate::error::AppResult;
use crate::report::{summary_line, summary_lines};
use crate::sink::write_json_document;

pub(crate) fn print_summary(outcome: &RunOutcome) {
    if outcome.interrupted {
        println!("Run interrupted; report covers completed requests only.");
    }
    println!("{}", summary_line(&outcome.report));
    for line in summary_lines(&outcome.report) {
        println!("{}", line);
    }
    if let Some(stats) = outcome.pipeline {
        println!(
            "Dispatched: {} of {} queued (peak queue depth {})",
            stats.dispatched, stats.produced, stats.peak_queue_depth
        );
    }
    if let Some(stats) = outcome.sink.as_ref() {
        println!("Results Written: {} ({} flushes)", stats.written, stats.flushes);
    }
}

/// Saves the report as pretty JSON.
pub(crate) async fn export_report(outcome: &RunOutcome, path: &Path) -> AppResult<()> {
    write_json_document(path, &outcome.report).await?;
    info!("Saved report to {}", path.display());
    Ok(())
}
