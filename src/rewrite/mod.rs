//! `rewrite-field`: sets one top-level field on every record of a JSON-lines
//! file, copying anything it cannot rewrite through unchanged.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, SinkError, SourceError};
use crate::source::LineRange;

/// Key under which a bare top-level array is nested when it gets wrapped.
const WRAPPED_ARRAY_KEY: &str = "messages";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRewrite {
    pub field: String,
    pub value: Value,
    pub range: LineRange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteCounts {
    /// Lines that parsed as JSON.
    pub processed: u64,
    /// Objects whose field already existed.
    pub modified: u64,
    /// Objects that gained the field, wrapped arrays included.
    pub added: u64,
}

enum LineEdit {
    Modified(Value),
    Added(Value),
    Unchanged,
}

impl FieldRewrite {
    fn apply(&self, parsed: Value) -> LineEdit {
        match parsed {
            Value::Object(mut object) => {
                let previous = object.insert(self.field.clone(), self.value.clone());
                if previous.is_some() {
                    LineEdit::Modified(Value::Object(object))
                } else {
                    LineEdit::Added(Value::Object(object))
                }
            }
            Value::Array(items) => {
                let mut object = Map::new();
                object.insert(WRAPPED_ARRAY_KEY.to_owned(), Value::Array(items));
                object.insert(self.field.clone(), self.value.clone());
                LineEdit::Added(Value::Object(object))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                LineEdit::Unchanged
            }
        }
    }
}

/// Rewrites `input` into `output` (truncating it). Blank lines and lines
/// outside the range are dropped.
///
/// # Errors
///
/// Returns an error when the input cannot be read or the output cannot be
/// created or written.
pub fn rewrite_field(input: &Path, output: &Path, rewrite: &FieldRewrite) -> AppResult<RewriteCounts> {
    let file = File::open(input).map_err(|err| read_error(input, err))?;
    let reader = BufReader::new(file);

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| write_error("create directory", parent, err))?;
    }
    let out = File::create(output).map_err(|err| {
        AppError::sink(SinkError::Open {
            path: output.to_path_buf(),
            source: err,
        })
    })?;
    let mut writer = BufWriter::new(out);

    let mut counts = RewriteCounts::default();
    let mut line_number = 0u64;
    for line in reader.lines() {
        line_number = line_number.saturating_add(1);
        let line = line.map_err(|err| read_error(input, err))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(start) = rewrite.range.start
            && line_number < start
        {
            continue;
        }
        if let Some(end) = rewrite.range.end
            && line_number > end
        {
            break;
        }

        let rendered = match serde_json::from_str::<Value>(trimmed) {
            Ok(parsed) => {
                counts.processed = counts.processed.saturating_add(1);
                match rewrite.apply(parsed) {
                    LineEdit::Modified(value) => {
                        counts.modified = counts.modified.saturating_add(1);
                        debug!("line {}: {} replaced", line_number, rewrite.field);
                        serde_json::to_string(&value)?
                    }
                    LineEdit::Added(value) => {
                        counts.added = counts.added.saturating_add(1);
                        debug!("line {}: {} added", line_number, rewrite.field);
                        serde_json::to_string(&value)?
                    }
                    LineEdit::Unchanged => {
                        warn!("line {}: not an object or array, copied as-is", line_number);
                        trimmed.to_owned()
                    }
                }
            }
            Err(err) => {
                warn!("line {}: invalid JSON ({}), copied as-is", line_number, err);
                trimmed.to_owned()
            }
        };
        writer
            .write_all(rendered.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|err| write_error("write", output, err))?;
    }
    writer
        .flush()
        .map_err(|err| write_error("flush", output, err))?;

    info!(
        "Rewrote {}: processed {}, modified {}, added {}",
        output.display(),
        counts.processed,
        counts.modified,
        counts.added
    );
    Ok(counts)
}

fn read_error(path: &Path, source: std::io::Error) -> AppError {
    if source.kind() == std::io::ErrorKind::NotFound {
        AppError::source(SourceError::NotFound {
            path: path.to_path_buf(),
        })
    } else {
        AppError::source(SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_error(context: &'static str, path: &Path, source: std::io::Error) -> AppError {
    AppError::sink(SinkError::Io {
        context,
        path: PathBuf::from(path),
        source,
    })
}
