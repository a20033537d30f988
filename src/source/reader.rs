use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, SourceError};

/// Inclusive 1-based window over physical lines (or document elements).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl LineRange {
    #[must_use]
    pub const fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    const fn is_before(&self, position: u64) -> bool {
        match self.start {
            Some(start) => position < start,
            None => false,
        }
    }

    const fn is_after(&self, position: u64) -> bool {
        match self.end {
            Some(end) => position > end,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// One record per line.
    Lines,
    /// A single JSON document holding a list of records or one record.
    Document,
}

impl SourceFormat {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error for extensions other than `.jsonl`, `.ndjson` and `.json`.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "jsonl" | "ndjson" => Ok(Self::Lines),
            "json" => Ok(Self::Document),
            _ => Err(AppError::source(SourceError::UnsupportedExtension { ext })),
        }
    }
}

enum Backing {
    Lines {
        reader: BufReader<File>,
        line_no: u64,
        buf: Vec<u8>,
    },
    Document {
        items: std::vec::IntoIter<Value>,
        position: u64,
    },
}

/// Lazy reader yielding one parsed payload at a time.
///
/// Line files are read incrementally so memory stays bounded by the longest
/// line. Blank lines are ignored; lines that fail to parse are skipped with
/// a warning and counted in [`RecordReader::skipped`].
pub struct RecordReader {
    path: PathBuf,
    range: LineRange,
    backing: Backing,
    skipped: u64,
    exhausted: bool,
}

impl RecordReader {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, unreadable, or has an
    /// unsupported extension.
    pub async fn open(path: &Path, range: LineRange) -> AppResult<Self> {
        let format = SourceFormat::from_path(path)?;
        let backing = match format {
            SourceFormat::Lines => {
                let file = File::open(path).await.map_err(|err| open_error(path, err))?;
                Backing::Lines {
                    reader: BufReader::new(file),
                    line_no: 0,
                    buf: Vec::new(),
                }
            }
            SourceFormat::Document => {
                let raw = tokio::fs::read(path)
                    .await
                    .map_err(|err| open_error(path, err))?;
                Backing::Document {
                    items: document_items(path, &raw).into_iter(),
                    position: 0,
                }
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            range,
            backing,
            skipped: 0,
            exhausted: false,
        })
    }

    /// Returns the next payload, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying file cannot be read.
    pub async fn next_payload(&mut self) -> AppResult<Option<Value>> {
        if self.exhausted {
            return Ok(None);
        }
        let next = match &mut self.backing {
            Backing::Lines {
                reader,
                line_no,
                buf,
            } => {
                next_line_payload(&self.path, self.range, reader, line_no, buf, &mut self.skipped)
                    .await?
            }
            Backing::Document { items, position } => next_document_item(self.range, items, position),
        };
        if next.is_none() {
            self.exhausted = true;
            debug!(
                "Finished reading '{}' ({} malformed records skipped)",
                self.path.display(),
                self.skipped
            );
        }
        Ok(next)
    }

    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn next_line_payload(
    path: &Path,
    range: LineRange,
    reader: &mut BufReader<File>,
    line_no: &mut u64,
    buf: &mut Vec<u8>,
    skipped: &mut u64,
) -> AppResult<Option<Value>> {
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', buf).await.map_err(|err| {
            AppError::source(SourceError::Read {
                path: path.to_path_buf(),
                source: err,
            })
        })?;
        if read == 0 {
            return Ok(None);
        }
        *line_no = line_no.saturating_add(1);
        if range.is_after(*line_no) {
            return Ok(None);
        }
        if range.is_before(*line_no) {
            continue;
        }
        let Ok(text) = std::str::from_utf8(buf) else {
            warn!("Skipping line {} of '{}': not valid UTF-8", line_no, path.display());
            *skipped = skipped.saturating_add(1);
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => return Ok(Some(value)),
            Err(err) => {
                warn!("Skipping line {} of '{}': {}", line_no, path.display(), err);
                *skipped = skipped.saturating_add(1);
            }
        }
    }
}

fn next_document_item(
    range: LineRange,
    items: &mut std::vec::IntoIter<Value>,
    position: &mut u64,
) -> Option<Value> {
    for item in items.by_ref() {
        *position = position.saturating_add(1);
        if range.is_after(*position) {
            return None;
        }
        if range.is_before(*position) {
            continue;
        }
        return Some(item);
    }
    None
}

/// Splits a JSON document into records. A document that does not parse, or
/// that holds neither an object nor a list, yields no records.
fn document_items(path: &Path, raw: &[u8]) -> Vec<Value> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(object @ Value::Object(_)) => vec![object],
        Ok(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            warn!(
                "'{}' holds neither an object nor a list of records; nothing to read",
                path.display()
            );
            Vec::new()
        }
        Err(err) => {
            warn!("Failed to parse JSON document '{}': {}", path.display(), err);
            Vec::new()
        }
    }
}

fn open_error(path: &Path, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return AppError::source(SourceError::NotFound {
            path: path.to_path_buf(),
        });
    }
    AppError::source(SourceError::Read {
        path: path.to_path_buf(),
        source: err,
    })
}
