//! Bounded producer/consumer pipeline: one producer drains a
//! [`RecordStream`] into a queue, N consumers dispatch and fan outcomes out
//! to the sink and the report.
mod consumer;
mod producer;


use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use crate::domain::RequestRecord;
use crate::error::{AppError, AppResult};
use crate::http::Dispatch;
use crate::report::ReportAggregator;
use crate::shutdown::ShutdownSender;
use crate::sink::SinkHandle;
use crate::source::RecordStream;

use consumer::{ConsumerContext, run_consumer};
use producer::run_producer;

/// Queue capacity used per unit of configured rate.
pub const QUEUE_CAPACITY_PER_RATE: usize = 10;

/// Largest capacity a bounded tokio channel accepts.
pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

#[derive(Debug)]
enum QueueItem {
    Record(RequestRecord),
    /// End of stream. The producer enqueues one per consumer.
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub consumers: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records pushed into the queue.
    pub produced: u64,
    /// Records that reached a terminal outcome.
    pub dispatched: u64,
    /// Highest number of queued, unconsumed records observed.
    pub peak_queue_depth: usize,
    /// A shutdown signal cut the run short.
    pub interrupted: bool,
}

pub struct Pipeline<S> {
    source: S,
    dispatcher: Arc<dyn Dispatch>,
    sink: SinkHandle,
    report: Arc<ReportAggregator>,
    config: PipelineConfig,
    shutdown_tx: ShutdownSender,
}

impl<S> Pipeline<S>
where
    S: RecordStream + 'static,
{
    #[must_use]
    pub fn new(
        source: S,
        dispatcher: Arc<dyn Dispatch>,
        sink: SinkHandle,
        report: Arc<ReportAggregator>,
        config: PipelineConfig,
        shutdown_tx: &ShutdownSender,
    ) -> Self {
        Self {
            source,
            dispatcher,
            sink,
            report,
            config,
            shutdown_tx: shutdown_tx.clone(),
        }
    }

    /// Runs until the source is exhausted and every consumer has exited.
    ///
    /// On shutdown the producer stops reading and consumers exit after the
    /// record in hand; that is reported through
    /// [`PipelineStats::interrupted`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns the source read error or sink write error that stopped the
    /// run. Dispatch failures never surface here; they become outcomes.
    pub async fn run(self) -> AppResult<PipelineStats> {
        let consumers = self.config.consumers.max(1);
        let capacity = self.config.queue_capacity.clamp(1, MAX_QUEUE_CAPACITY);
        let (tx, rx) = mpsc::channel::<QueueItem>(capacity);
        let rx = Arc::new(Mutex::new(rx));

        // Subscribe everyone before any task can broadcast.
        let consumer_handles: Vec<_> = (0..consumers)
            .map(|worker_id| {
                let ctx = ConsumerContext {
                    worker_id,
                    queue: rx.clone(),
                    dispatcher: self.dispatcher.clone(),
                    sink: self.sink.clone(),
                    report: self.report.clone(),
                    shutdown_tx: self.shutdown_tx.clone(),
                    shutdown_rx: self.shutdown_tx.subscribe(),
                };
                tokio::spawn(run_consumer(ctx))
            })
            .collect();
        let producer_handle = tokio::spawn(run_producer(
            self.source,
            tx,
            consumers,
            self.shutdown_tx.subscribe(),
        ));

        let mut first_error: Option<AppError> = None;
        let mut stats = PipelineStats::default();
        match producer_handle.await {
            Ok(Ok(report)) => {
                stats.produced = report.produced;
                stats.peak_queue_depth = report.peak_queue_depth;
                stats.interrupted = report.interrupted;
            }
            Ok(Err(err)) => first_error = Some(err),
            Err(err) => first_error = Some(AppError::from(err)),
        }
        for handle in consumer_handles {
            match handle.await {
                Ok(Ok(dispatched)) => stats.dispatched = stats.dispatched.saturating_add(dispatched),
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(AppError::from(err));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        if stats.interrupted && stats.produced > stats.dispatched {
            warn!(
                "Shutdown left {} queued records undispatched",
                stats.produced.saturating_sub(stats.dispatched)
            );
        }
        info!(
            "Pipeline finished: {} records dispatched by {} consumers (peak queue depth {})",
            stats.dispatched, consumers, stats.peak_queue_depth
        );
        Ok(stats)
    }
}
