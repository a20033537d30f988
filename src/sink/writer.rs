use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, info};

use crate::domain::Outcome;
use crate::error::{AppError, AppResult, SinkError};
use crate::pipeline::MAX_QUEUE_CAPACITY;

pub const DEFAULT_QUEUE_CAPACITY: usize = 20;
pub const DEFAULT_FLUSH_COUNT: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Outcomes that may wait for the writer before `write` suspends.
    pub queue_capacity: usize,
    /// Flush after this many lines since the last flush; `0` disables.
    pub flush_count: usize,
    /// Flush once this much time passed since the last flush; zero disables.
    pub flush_interval: Duration,
    /// How long the writer waits for new input before re-checking the
    /// time threshold.
    pub idle_wait: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_count: DEFAULT_FLUSH_COUNT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub written: u64,
    pub flushes: u64,
}

#[derive(Debug)]
enum SinkMessage {
    Outcome(Outcome),
    Stop,
}

/// Cloneable write side of an [`OutcomeSink`].
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<SinkMessage>,
}

impl SinkHandle {
    /// Queues one outcome, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] once the writer has stopped or failed.
    pub async fn write(&self, outcome: Outcome) -> AppResult<()> {
        self.tx
            .send(SinkMessage::Outcome(outcome))
            .await
            .map_err(|_closed| AppError::sink(SinkError::Closed))
    }
}

/// Append-only JSONL writer running on its own task.
pub struct OutcomeSink {
    path: PathBuf,
    handle: SinkHandle,
    task: JoinHandle<Result<SinkStats, SinkError>>,
}

impl OutcomeSink {
    /// Opens `path` in append mode and starts the writer task.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or its parent directory cannot be
    /// created.
    pub async fn start(path: &Path, config: SinkConfig) -> AppResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                AppError::sink(SinkError::Io {
                    context: "create directory",
                    path: parent.to_path_buf(),
                    source: err,
                })
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|err| {
                AppError::sink(SinkError::Open {
                    path: path.to_path_buf(),
                    source: err,
                })
            })?;

        let (tx, rx) = mpsc::channel(config.queue_capacity.clamp(1, MAX_QUEUE_CAPACITY));
        let task = tokio::spawn(run_writer(file, path.to_path_buf(), config, rx));
        info!("Writing outcomes to '{}'", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            handle: SinkHandle { tx },
            task,
        })
    }

    #[must_use]
    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queues one outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] once the writer has stopped or failed.
    pub async fn write(&self, outcome: Outcome) -> AppResult<()> {
        self.handle.write(outcome).await
    }

    /// Drains everything queued so far, flushes, and waits for the writer
    /// task to exit.
    ///
    /// # Errors
    ///
    /// Returns the writer's I/O or serialization error, if it hit one.
    pub async fn stop(self) -> AppResult<SinkStats> {
        // A failed send means the writer already exited; its result says why.
        drop(self.handle.tx.send(SinkMessage::Stop).await);
        let stats = self
            .task
            .await
            .map_err(|err| AppError::sink(SinkError::WriterPanicked { source: err }))??;
        info!(
            "Stopped writer for '{}': {} outcomes, {} flushes",
            self.path.display(),
            stats.written,
            stats.flushes
        );
        Ok(stats)
    }
}

struct FlushPolicy {
    count: usize,
    interval: Duration,
    pending: usize,
    last_flush: Instant,
}

impl FlushPolicy {
    fn new(config: &SinkConfig) -> Self {
        Self {
            count: config.flush_count,
            interval: config.flush_interval,
            pending: 0,
            last_flush: Instant::now(),
        }
    }

    fn is_due(&self) -> bool {
        if self.pending == 0 {
            return false;
        }
        let by_count = self.count > 0 && self.pending >= self.count;
        let by_time = !self.interval.is_zero() && self.last_flush.elapsed() >= self.interval;
        by_count || by_time
    }

    fn mark_flushed(&mut self) {
        self.pending = 0;
        self.last_flush = Instant::now();
    }
}

async fn run_writer(
    file: File,
    path: PathBuf,
    config: SinkConfig,
    mut rx: mpsc::Receiver<SinkMessage>,
) -> Result<SinkStats, SinkError> {
    let mut writer = BufWriter::new(file);
    let mut policy = FlushPolicy::new(&config);
    let mut stats = SinkStats::default();
    let mut line = Vec::with_capacity(1024);
    let idle_wait = config.idle_wait.max(Duration::from_millis(1));

    loop {
        match timeout(idle_wait, rx.recv()).await {
            Ok(Some(SinkMessage::Outcome(outcome))) => {
                line.clear();
                serde_json::to_writer(&mut line, &outcome)
                    .map_err(|err| SinkError::Serialize { source: err })?;
                line.push(b'\n');
                writer
                    .write_all(&line)
                    .await
                    .map_err(|err| io_error("write", &path, err))?;
                stats.written = stats.written.saturating_add(1);
                policy.pending = policy.pending.saturating_add(1);
            }
            Ok(Some(SinkMessage::Stop) | None) => break,
            Err(_idle) => {}
        }
        if policy.is_due() {
            writer
                .flush()
                .await
                .map_err(|err| io_error("flush", &path, err))?;
            policy.mark_flushed();
            stats.flushes = stats.flushes.saturating_add(1);
            debug!("Flushed '{}' ({} outcomes so far)", path.display(), stats.written);
        }
    }

    let final_pending = policy.pending;
    writer
        .flush()
        .await
        .map_err(|err| io_error("flush", &path, err))?;
    if final_pending > 0 {
        stats.flushes = stats.flushes.saturating_add(1);
    }
    Ok(stats)
}

fn io_error(context: &'static str, path: &Path, err: std::io::Error) -> SinkError {
    SinkError::Io {
        context,
        path: path.to_path_buf(),
        source: err,
    }
}
