//! Append-only structured step log.
//!
//! Each successful step invocation is serialized as one JSON record —
//! `{timestamp, node, inputs, outputs}` — appended to a local file and
//! echoed to the console. Purely diagnostic: no rotation, no retention,
//! no indexing, and sink failures never interrupt the pipeline.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One structured log record for a step invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// ISO-8601 UTC timestamp of the record.
    pub timestamp: String,
    /// Name of the step that produced the record.
    pub node: String,
    /// Snapshot of the state fields the step read.
    pub inputs: serde_json::Value,
    /// Snapshot of the fields the step produced.
    pub outputs: serde_json::Value,
}

/// Appends structured step records to a log file and the console.
///
/// The file handle is shared behind a mutex so a cloned logger can be held
/// by the executor and the entry point at once. If the file cannot be
/// opened the logger degrades to console-only and reports the problem a
/// single time via `tracing::warn!`.
#[derive(Clone)]
pub struct StepLogger {
    sink: Option<Arc<Mutex<File>>>,
}

impl StepLogger {
    /// Open (or create) the append-only log file at `path`.
    ///
    /// Parent directories are created as needed. Failure to open the sink
    /// is reported once and the logger continues console-only.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let sink = open_append(path.as_ref()).map(|file| Arc::new(Mutex::new(file)));
        Self { sink }
    }

    /// A logger with no file sink, echoing to the console only.
    #[must_use]
    pub fn console_only() -> Self {
        Self { sink: None }
    }

    /// Serialize and append one step record.
    ///
    /// Write failures are reported via `tracing::warn!` and otherwise
    /// swallowed — logging is a diagnostic side channel, never on the
    /// correctness path.
    pub fn log_step(&self, node: &str, inputs: &serde_json::Value, outputs: &serde_json::Value) {
        let record = StepRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            node: node.to_string(),
            inputs: inputs.clone(),
            outputs: outputs.clone(),
        };

        let pretty = match serde_json::to_string_pretty(&record) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(node, error = %err, "failed to serialize step record");
                return;
            }
        };

        tracing::info!(node, "step completed\n{pretty}");

        if let Some(sink) = &self.sink {
            let mut file = match sink.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::warn!(node, "step log mutex poisoned, record dropped");
                    return;
                }
            };
            if let Err(err) = writeln!(file, "{pretty}") {
                tracing::warn!(node, error = %err, "failed to append step record");
            }
        }
    }

    /// Append a detailed error record to the sink.
    ///
    /// Used by the entry point to persist the full failure before the
    /// user-facing message is printed.
    pub fn log_error(&self, node: &str, details: &str) {
        let record = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "node": node,
            "error": details,
        });
        let pretty = match serde_json::to_string_pretty(&record) {
            Ok(text) => text,
            Err(_) => return,
        };

        tracing::error!(node, "pipeline failed\n{pretty}");

        if let Some(sink) = &self.sink {
            if let Ok(mut file) = sink.lock() {
                if let Err(err) = writeln!(file, "{pretty}") {
                    tracing::warn!(node, error = %err, "failed to append error record");
                }
            }
        }
    }
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = create_dir_all(parent) {
                tracing::warn!(
                    path = %parent.display(),
                    error = %err,
                    "failed to create log directory, step log is console-only"
                );
                return None;
            }
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to open step log file, step log is console-only"
            );
            None
        }
    }
}
