use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult, SinkError};

/// Writes `value` as pretty JSON to `path`, replacing any previous file and
/// creating missing parent directories.
///
/// # Errors
///
/// Returns an error when the value cannot be serialized or the file cannot
/// be written.
pub async fn write_json_document<T>(path: &Path, value: &T) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let rendered = serde_json::to_vec_pretty(value)
        .map_err(|err| AppError::sink(SinkError::Serialize { source: err }))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| io_error("create directory", parent, err))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|err| AppError::sink(SinkError::Open {
            path: path.to_path_buf(),
            source: err,
        }))?;
    file.write_all(&rendered)
        .await
        .map_err(|err| io_error("write", path, err))?;
    file.write_all(b"\n")
        .await
        .map_err(|err| io_error("write", path, err))?;
    file.flush().await.map_err(|err| io_error("flush", path, err))?;
    Ok(())
}

fn io_error(context: &'static str, path: &Path, err: std::io::Error) -> AppError {
    AppError::sink(SinkError::Io {
        context,
        path: path.to_path_buf(),
        source: err,
    })
}
