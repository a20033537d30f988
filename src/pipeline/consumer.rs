use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error};

use super::QueueItem;
use crate::error::AppResult;
use crate::http::Dispatch;
use crate::report::ReportAggregator;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};
use crate::sink::SinkHandle;

pub(super) struct ConsumerContext {
    pub(super) worker_id: usize,
    pub(super) queue: Arc<Mutex<mpsc::Receiver<QueueItem>>>,
    pub(super) dispatcher: Arc<dyn Dispatch>,
    pub(super) sink: SinkHandle,
    pub(super) report: Arc<ReportAggregator>,
    pub(super) shutdown_tx: ShutdownSender,
    pub(super) shutdown_rx: ShutdownReceiver,
}

/// Pulls records until an end-of-stream marker or shutdown. Returns the
/// number of records dispatched.
pub(super) async fn run_consumer(mut ctx: ConsumerContext) -> AppResult<u64> {
    let mut dispatched: u64 = 0;
    loop {
        let item = tokio::select! {
            biased;
            _ = ctx.shutdown_rx.recv() => break,
            item = next_item(&ctx.queue) => item,
        };
        let record = match item {
            Some(QueueItem::Record(record)) => record,
            Some(QueueItem::EndOfStream) | None => break,
        };

        let outcome = ctx
            .dispatcher
            .send(record)
            .await
            .with_worker(ctx.worker_id);
        ctx.report.record(&outcome);
        if let Err(err) = ctx.sink.write(outcome).await {
            error!("Consumer {} could not persist outcome: {}", ctx.worker_id, err);
            drop(ctx.shutdown_tx.send(()));
            return Err(err);
        }
        dispatched = dispatched.saturating_add(1);
    }
    debug!("Consumer {} finished after {} records", ctx.worker_id, dispatched);
    Ok(dispatched)
}

async fn next_item(queue: &Mutex<mpsc::Receiver<QueueItem>>) -> Option<QueueItem> {
    queue.lock().await.recv().await
}
