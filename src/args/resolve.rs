use std::path::PathBuf;

use super::cli::{LoadlineArgs, RewriteFieldArgs};
use super::defaults::{SINGLE_OUTPUT_FILE, STREAM_OUTPUT_FILE};
use super::types::ReadMode;
use crate::error::{AppError, AppResult, ValidationError};
use crate::pipeline::{MAX_QUEUE_CAPACITY, QUEUE_CAPACITY_PER_RATE};
use crate::sink::{DEFAULT_IDLE_WAIT, SinkConfig};
use crate::source::{LineRange, Selection};

impl LoadlineArgs {
    /// Turns `--read-mode` and its companion flags into a [`Selection`].
    ///
    /// # Errors
    ///
    /// Returns a validation error when a counted mode lacks `--count`, when
    /// the line range is inverted, or when a line range is combined with a
    /// mode other than `full`.
    pub fn selection(&self) -> AppResult<Selection> {
        let start = self.start_line.map(u64::from);
        let end = self.end_line.map(u64::from);
        let range = checked_range(start, end)?;
        if !range.is_unbounded() && self.read_mode != ReadMode::Full {
            return Err(AppError::validation(
                ValidationError::LineRangeRequiresFullMode,
            ));
        }

        let count = || {
            self.count.map(usize::from).ok_or_else(|| {
                AppError::validation(ValidationError::CountRequired {
                    mode: self.read_mode.as_str(),
                })
            })
        };

        let selection = match self.read_mode {
            ReadMode::Full => Selection::Full { range },
            ReadMode::FirstN => Selection::FirstN { count: count()? },
            ReadMode::RandomN => Selection::RandomN {
                count: count()?,
                seed: self.seed,
            },
            ReadMode::ExactCount => Selection::ExactCount {
                count: count()?,
                fill: !self.no_fill,
            },
        };
        Ok(selection)
    }

    /// Pipeline queue capacity: `--buffer`, else ten slots per request per
    /// second of `--rate`. Never exceeds [`MAX_QUEUE_CAPACITY`].
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "capacity scales with a fractional rate")]
    pub fn queue_capacity(&self) -> usize {
        if let Some(buffer) = self.buffer {
            return buffer.get().min(MAX_QUEUE_CAPACITY);
        }
        let scaled = (self.rate * QUEUE_CAPACITY_PER_RATE as f64).ceil();
        if scaled.is_finite() && scaled >= 1.0 {
            (scaled as usize).min(MAX_QUEUE_CAPACITY)
        } else {
            1
        }
    }

    #[must_use]
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            queue_capacity: self.sink_buffer.get().min(MAX_QUEUE_CAPACITY),
            flush_count: self.flush_count,
            flush_interval: self.flush_interval,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }

    #[must_use]
    pub fn stream_output_path(&self) -> PathBuf {
        self.output_dir.join(STREAM_OUTPUT_FILE)
    }

    #[must_use]
    pub fn single_output_path(&self) -> PathBuf {
        self.output_dir.join(SINGLE_OUTPUT_FILE)
    }
}

impl RewriteFieldArgs {
    /// # Errors
    ///
    /// Returns a validation error when the line range is inverted.
    pub fn range(&self) -> AppResult<LineRange> {
        checked_range(self.start_line.map(u64::from), self.end_line.map(u64::from))
    }
}

fn checked_range(start: Option<u64>, end: Option<u64>) -> AppResult<LineRange> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(AppError::validation(ValidationError::LineRangeInverted {
            start,
            end,
        }));
    }
    Ok(LineRange::new(start, end))
}
