use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::args::LoadlineArgs;
use crate::config::Environment;
use crate::domain::Outcome;
use crate::error::{AppError, AppResult, SinkError, SourceError};
use crate::http::{Dispatch, HttpDispatcher, RateLimiter, build_client, build_headers};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineStats};
use crate::report::{Report, ReportAggregator};
use crate::shutdown::{
    ShutdownReceiver, ShutdownSender, setup_signal_shutdown_handler, shutdown_channel,
};
use crate::sink::{OutcomeSink, SinkHandle, SinkStats, write_json_document};
use crate::source::{RecordStream, Selection, StreamSource};

pub(crate) struct RunOutcome {
    pub report: Report,
    pub pipeline: Option<PipelineStats>,
    pub sink: Option<SinkStats>,
    pub interrupted: bool,
}

struct RunContext<'run> {
    args: &'run LoadlineArgs,
    dispatcher: Arc<dyn Dispatch>,
    report: Arc<ReportAggregator>,
    shutdown_tx: ShutdownSender,
}

/// Sends the optional single request, then streams `--data` through the
/// pipeline. The result sink is stopped on every exit path before this
/// returns.
pub(crate) async fn run_load(
    args: &LoadlineArgs,
    environment: &Environment,
) -> AppResult<RunOutcome> {
    let selection = args.data.as_ref().map(|_| args.selection()).transpose()?;

    let headers = build_headers(&args.headers, &environment.credential)?;
    let client = build_client(args.timeout, args.connect_timeout)?;
    let limiter = Arc::new(RateLimiter::per_second(args.rate)?);
    let period = limiter.period();
    let dispatcher: Arc<dyn Dispatch> = Arc::new(HttpDispatcher::new(
        client,
        environment.endpoint_url.clone(),
        args.method,
        headers,
        limiter,
        args.log_mode,
    ));

    info!(
        "Target {} [{}], {} req/s (one every {:?}), {} worker(s)",
        environment.endpoint_url,
        environment.env,
        args.rate,
        period,
        args.workers.get()
    );

    let (shutdown_tx, _) = shutdown_channel();
    let mut interrupt_rx = shutdown_tx.subscribe();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let sink = match args.data.as_ref() {
        Some(_) => Some(OutcomeSink::start(&args.stream_output_path(), args.sink_config()).await?),
        None => None,
    };

    let context = RunContext {
        args,
        dispatcher,
        report: Arc::new(ReportAggregator::new()),
        shutdown_tx,
    };
    let handle = sink.as_ref().map(OutcomeSink::handle);
    let driven = drive(&context, selection, handle, &mut interrupt_rx).await;

    let stopped = match sink {
        Some(sink) => sink.stop().await.map(Some),
        None => Ok(None),
    };
    signal_handle.abort();

    let (pipeline, sink_stats) = settle(driven, stopped)?;
    let interrupted = pipeline.is_some_and(|stats| stats.interrupted)
        || !matches!(interrupt_rx.try_recv(), Err(TryRecvError::Empty));

    Ok(RunOutcome {
        report: context.report.summarize(),
        pipeline,
        sink: sink_stats,
        interrupted,
    })
}

/// Combines the run result with the writer's stop result. When both failed
/// and the run only saw the closed writer, the writer's own error is the
/// one worth reporting.
pub(super) fn settle(
    driven: AppResult<Option<PipelineStats>>,
    stopped: AppResult<Option<SinkStats>>,
) -> AppResult<(Option<PipelineStats>, Option<SinkStats>)> {
    match (driven, stopped) {
        (Ok(pipeline), Ok(sink)) => Ok((pipeline, sink)),
        (Ok(_), Err(stop_err)) => Err(stop_err),
        (Err(err), Ok(_)) => Err(err),
        (Err(err @ AppError::Sink(SinkError::Closed)), Err(stop_err)) => {
            debug!("Run stopped on a closed writer: {}", err);
            Err(stop_err)
        }
        (Err(err), Err(stop_err)) => {
            error!("Failed to stop result writer: {}", stop_err);
            Err(err)
        }
    }
}

async fn drive(
    context: &RunContext<'_>,
    selection: Option<Selection>,
    sink: Option<SinkHandle>,
    interrupt_rx: &mut ShutdownReceiver,
) -> AppResult<Option<PipelineStats>> {
    let args = context.args;

    let mut first_sequence = 1;
    if let Some(path) = args.request_body.as_deref() {
        let outcome = send_single(path, context.dispatcher.as_ref()).await?;
        first_sequence = outcome.sequence_number.saturating_add(1);
        context.report.record(&outcome);
        match sink.as_ref() {
            Some(handle) => handle.write(outcome).await?,
            None => {
                let target = args.single_output_path();
                write_json_document(&target, &outcome).await?;
                info!("Saved single response to {}", target.display());
            }
        }
    }

    let (Some(path), Some(selection), Some(sink)) = (args.data.as_deref(), selection, sink)
    else {
        return Ok(None);
    };

    if !matches!(interrupt_rx.try_recv(), Err(TryRecvError::Empty)) {
        warn!("Shutdown requested before streaming {}; skipping.", path.display());
        return Ok(Some(PipelineStats {
            interrupted: true,
            ..PipelineStats::default()
        }));
    }

    let source = StreamSource::open(path, selection)
        .await?
        .with_first_sequence(first_sequence);
    let config = PipelineConfig {
        queue_capacity: args.queue_capacity(),
        consumers: args.workers.get(),
    };
    let pipeline = Pipeline::new(
        source,
        Arc::clone(&context.dispatcher),
        sink,
        Arc::clone(&context.report),
        config,
        &context.shutdown_tx,
    );
    pipeline.run().await.map(Some)
}

/// Dispatches the first record of `path` once.
async fn send_single(path: &Path, dispatcher: &dyn Dispatch) -> AppResult<Outcome> {
    let mut source = StreamSource::open(path, Selection::FirstN { count: 1 }).await?;
    let record = source.next_record().await?.ok_or_else(|| {
        AppError::source(SourceError::Empty {
            path: path.to_path_buf(),
        })
    })?;
    info!("Sending single request from {}", path.display());
    Ok(dispatcher.send(record).await)
}
