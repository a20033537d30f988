use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{info, warn};

use super::RecordStream;
use super::reader::{LineRange, RecordReader};
use crate::domain::RequestRecord;
use crate::error::AppResult;

/// Which records a run takes from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every record, optionally restricted to a line range.
    Full { range: LineRange },
    /// The first `count` records in source order.
    FirstN { count: usize },
    /// `count` records sampled uniformly without replacement.
    RandomN { count: usize, seed: Option<u64> },
    /// Exactly `count` records; short sources are padded with the first
    /// record when `fill` is set.
    ExactCount { count: usize, fill: bool },
}

impl Selection {
    const fn range(&self) -> LineRange {
        match self {
            Selection::Full { range } => *range,
            Selection::FirstN { .. } | Selection::RandomN { .. } | Selection::ExactCount { .. } => {
                LineRange {
                    start: None,
                    end: None,
                }
            }
        }
    }
}

/// Applies a [`Selection`] to a [`RecordReader`] and numbers the records it
/// hands out, starting at 1 unless [`StreamSource::with_first_sequence`]
/// says otherwise.
pub struct StreamSource {
    reader: RecordReader,
    selection: Selection,
    first_sequence: u64,
    emitted: u64,
    from_reader: usize,
    first: Option<Value>,
    sample: Option<VecDeque<Value>>,
    finished: bool,
}

impl StreamSource {
    /// Opens `path` and prepares `selection` over it.
    ///
    /// # Errors
    ///
    /// Returns an error when the source file cannot be opened.
    pub async fn open(path: &Path, selection: Selection) -> AppResult<Self> {
        let reader = RecordReader::open(path, selection.range()).await?;
        Ok(Self::from_reader(reader, selection))
    }

    #[must_use]
    pub const fn from_reader(reader: RecordReader, selection: Selection) -> Self {
        Self {
            reader,
            selection,
            first_sequence: 1,
            emitted: 0,
            from_reader: 0,
            first: None,
            sample: None,
            finished: false,
        }
    }

    /// Numbers records from `first` instead of 1, for runs that already
    /// used the lower sequence numbers.
    #[must_use]
    pub const fn with_first_sequence(mut self, first: u64) -> Self {
        self.first_sequence = first;
        self
    }

    /// Records handed out so far.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Malformed records skipped by the underlying reader.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.reader.skipped()
    }

    async fn next_payload(&mut self) -> AppResult<Option<Value>> {
        if self.finished {
            return Ok(None);
        }
        let payload = match self.selection.clone() {
            Selection::Full { .. } => self.reader.next_payload().await?,
            Selection::FirstN { count } => self.next_first_n(count).await?,
            Selection::RandomN { count, seed } => self.next_random_n(count, seed).await?,
            Selection::ExactCount { count, fill } => self.next_exact(count, fill).await?,
        };
        if payload.is_none() {
            self.finished = true;
            info!(
                "Read {} records from '{}'",
                self.emitted,
                self.reader.path().display()
            );
        }
        Ok(payload)
    }

    async fn next_first_n(&mut self, count: usize) -> AppResult<Option<Value>> {
        if self.from_reader >= count {
            return Ok(None);
        }
        let payload = self.reader.next_payload().await?;
        match payload {
            Some(_) => self.from_reader = self.from_reader.saturating_add(1),
            None => warn!(
                "Requested {} records but '{}' holds only {}; using all of them",
                count,
                self.reader.path().display(),
                self.from_reader
            ),
        }
        Ok(payload)
    }

    async fn next_exact(&mut self, count: usize, fill: bool) -> AppResult<Option<Value>> {
        let handed_out = usize::try_from(self.emitted).unwrap_or(usize::MAX);
        if handed_out >= count {
            return Ok(None);
        }
        if self.from_reader == handed_out
            && let Some(payload) = self.reader.next_payload().await?
        {
            self.from_reader = self.from_reader.saturating_add(1);
            if self.first.is_none() {
                self.first = Some(payload.clone());
            }
            return Ok(Some(payload));
        }
        if self.from_reader == handed_out {
            // Source ran dry on this call; report the shortfall once.
            self.from_reader = usize::MAX;
            let available = handed_out;
            match (&self.first, fill) {
                (Some(_), true) => info!(
                    "Source holds {} of {} requested records; padding with the first record",
                    available, count
                ),
                (Some(_), false) => warn!(
                    "Source holds {} of {} requested records; padding disabled",
                    available, count
                ),
                (None, _) => warn!("Source is empty; nothing to pad with"),
            }
        }
        if fill {
            return Ok(self.first.clone());
        }
        Ok(None)
    }

    async fn next_random_n(&mut self, count: usize, seed: Option<u64>) -> AppResult<Option<Value>> {
        if self.sample.is_none() {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let (mut sample, seen) = reservoir_sample(&mut self.reader, count, &mut rng).await?;
            sample.shuffle(&mut rng);
            if seen < count {
                warn!(
                    "Requested {} random records but '{}' holds only {}; using all of them",
                    count,
                    self.reader.path().display(),
                    seen
                );
            }
            self.sample = Some(sample.into());
        }
        Ok(self.sample.as_mut().and_then(VecDeque::pop_front))
    }
}

#[async_trait]
impl RecordStream for StreamSource {
    async fn next_record(&mut self) -> AppResult<Option<RequestRecord>> {
        let Some(payload) = self.next_payload().await? else {
            return Ok(None);
        };
        let sequence = self.first_sequence.saturating_add(self.emitted);
        self.emitted = self.emitted.saturating_add(1);
        Ok(Some(RequestRecord::new(sequence, payload)))
    }
}

/// Single pass reservoir sampling (Algorithm R). Holds at most `count`
/// payloads; returns the sample and the number of payloads seen.
async fn reservoir_sample<R>(
    reader: &mut RecordReader,
    count: usize,
    rng: &mut R,
) -> AppResult<(Vec<Value>, usize)>
where
    R: Rng + Send,
{
    let mut reservoir: Vec<Value> = Vec::with_capacity(count.min(4096));
    let mut seen = 0usize;
    while let Some(payload) = reader.next_payload().await? {
        seen = seen.saturating_add(1);
        if reservoir.len() < count {
            reservoir.push(payload);
            continue;
        }
        let slot = rng.gen_range(0..seen);
        if let Some(entry) = reservoir.get_mut(slot) {
            *entry = payload;
        }
    }
    Ok((reservoir, seen))
}
