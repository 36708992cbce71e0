//! Built-in sinks.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{EmitError, GraphRecord, GraphSink};

/// Writes one JSON object per line, to a file or to stdout.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: Option<PathBuf>,
}

impl JsonLinesSink {
    /// Sink that atomically replaces the file at `path`.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn to_stdout() -> Self {
        Self { path: None }
    }

    /// File sink when a path is given, stdout otherwise.
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Serialize records as JSON lines.
pub fn to_json_lines(records: &[GraphRecord]) -> Result<String, EmitError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write `body` to a temporary sibling of `path`, then rename it into place.
async fn replace_file(path: &Path, body: &[u8]) -> Result<(), EmitError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("graph.jsonl");
    let temp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = async {
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| EmitError::io(&temp, e))?;
        file.write_all(body).await.map_err(|e| EmitError::io(&temp, e))?;
        file.sync_all().await.map_err(|e| EmitError::io(&temp, e))?;
        drop(file);
        tokio::fs::rename(&temp, path)
            .await
            .map_err(|e| EmitError::io(path, e))
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }
    result
}

#[async_trait]
impl GraphSink for JsonLinesSink {
    async fn write_batch(&self, records: &[GraphRecord]) -> Result<usize, EmitError> {
        let body = to_json_lines(records)?;
        match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| EmitError::io(parent, e))?;
                }
                replace_file(path, body.as_bytes()).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(body.as_bytes())
                    .await
                    .map_err(|e| EmitError::io("<stdout>", e))?;
                stdout.flush().await.map_err(|e| EmitError::io("<stdout>", e))?;
            }
        }
        Ok(records.len())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<GraphRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn records(&self) -> Vec<GraphRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn write_batch(&self, records: &[GraphRecord]) -> Result<usize, EmitError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(records);
        Ok(records.len())
    }
}
