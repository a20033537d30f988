use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::QueueItem;
use crate::error::AppResult;
use crate::shutdown::ShutdownReceiver;
use crate::source::RecordStream;

pub(super) struct ProducerReport {
    pub(super) produced: u64,
    pub(super) peak_queue_depth: usize,
    pub(super) interrupted: bool,
}

/// Pushes every record into the bounded queue, suspending while it is full,
/// then enqueues one end-of-stream marker per consumer.
pub(super) async fn run_producer<S>(
    mut source: S,
    tx: mpsc::Sender<QueueItem>,
    consumers: usize,
    mut shutdown_rx: ShutdownReceiver,
) -> AppResult<ProducerReport>
where
    S: RecordStream,
{
    let mut report = ProducerReport {
        produced: 0,
        peak_queue_depth: 0,
        interrupted: false,
    };

    let read_result = loop {
        let next = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                report.interrupted = true;
                break Ok(());
            }
            next = source.next_record() => next,
        };
        let record = match next {
            Ok(Some(record)) => record,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        };
        if !enqueue(&tx, QueueItem::Record(record), &mut shutdown_rx).await {
            report.interrupted = true;
            break Ok(());
        }
        report.produced = report.produced.saturating_add(1);
        let depth = tx.max_capacity().saturating_sub(tx.capacity());
        report.peak_queue_depth = report.peak_queue_depth.max(depth);
    };

    if report.interrupted {
        // Consumers watch the same signal; no markers needed.
        debug!("Producer stopped after {} records", report.produced);
    } else {
        for _ in 0..consumers {
            if !enqueue(&tx, QueueItem::EndOfStream, &mut shutdown_rx).await {
                report.interrupted = true;
                break;
            }
        }
    }

    match read_result {
        Ok(()) => Ok(report),
        Err(err) => {
            warn!("Source failed after {} records: {}", report.produced, err);
            Err(err)
        }
    }
}

/// Sends `item`, giving up when shutdown is signalled or every consumer is
/// gone. Returns whether the item was queued.
async fn enqueue(
    tx: &mpsc::Sender<QueueItem>,
    item: QueueItem,
    shutdown_rx: &mut ShutdownReceiver,
) -> bool {
    tokio::select! {
        biased;
        _ = shutdown_rx.recv() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
