//! Structured pipeline execution events for tracing and observability.
//!
//! This module defines the event types emitted during pipeline execution,
//! enabling detailed tracking of step execution, retries, and errors.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Events that can be emitted during pipeline execution.
///
/// These events provide structured observability into pipeline behavior,
/// replacing unstructured string logs with typed, serializable data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PipelineEvent {
    /// A step has started execution.
    StepStart {
        /// Name of the step being executed.
        step_name: String,
        /// Snapshot of the state fields the step reads.
        inputs: serde_json::Value,
    },
    /// A step has finished successfully.
    StepEnd {
        /// Name of the step that completed.
        step_name: String,
        /// Duration of execution in milliseconds.
        duration_ms: u128,
    },
    /// A completion call failed transiently and is being retried.
    Retry {
        /// Name of the step whose call is retried.
        step_name: String,
        /// The attempt number about to run (1-based).
        attempt: u32,
        /// Backoff delay before the attempt, in milliseconds.
        delay_ms: u64,
    },
    /// An error occurred during step execution.
    Error {
        /// Name of the step where the error occurred.
        step_name: String,
        /// Error message describing what went wrong.
        message: String,
    },
}

/// A timestamped trace entry containing a pipeline event.
///
/// Each trace entry records when the event occurred (as Unix epoch
/// milliseconds) along with the event itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Unix epoch timestamp in milliseconds when this event occurred.
    pub timestamp: u128,
    /// The pipeline event that was recorded.
    #[serde(flatten)]
    pub event: PipelineEvent,
}

impl TraceEntry {
    /// Create a new trace entry with the current timestamp.
    #[must_use]
    pub fn new(event: PipelineEvent) -> Self {
        let start = SystemTime::now();
        let timestamp = start
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis();
        Self { timestamp, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_entry_serialization() {
        let event = PipelineEvent::StepStart {
            step_name: "summarize".to_string(),
            inputs: serde_json::json!({"context": "..."}),
        };
        let entry = TraceEntry::new(event);

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"StepStart\""));
        assert!(json.contains("\"step_name\":\"summarize\""));
        assert!(json.contains("\"timestamp\":"));
    }

    #[test]
    fn test_retry_event() {
        let event = PipelineEvent::Retry {
            step_name: "answer".to_string(),
            attempt: 2,
            delay_ms: 2000,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Retry\""));
        assert!(json.contains("\"attempt\":2"));
    }
}
