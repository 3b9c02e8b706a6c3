//! Execution context for pipeline runs.
//!
//! This module provides the `ExecutionContext` which is passed to the
//! orchestrator and the step executor, enabling metrics collection and
//! event tracing without any global mutable state.

use std::sync::{Arc, Mutex};

use crate::events::{PipelineEvent, TraceEntry};
use crate::metrics::PipelineMetrics;

/// Context shared across one pipeline run.
///
/// The context is cloneable and thread-safe; all metric updates are
/// synchronized. It is constructed by the caller (or by
/// [`Pipeline::run`](crate::Pipeline::run)) and passed by reference, never
/// installed as a process-wide global.
///
/// # Tracing
///
/// The context maintains a structured trace log of pipeline events,
/// enabling detailed observability without relying on unstructured string
/// logs.
///
/// # Example
///
/// ```rust
/// use qa_pipeline::{ExecutionContext, PipelineEvent};
///
/// let ctx = ExecutionContext::new();
/// ctx.emit(PipelineEvent::StepEnd {
///     step_name: "summarize".to_string(),
///     duration_ms: 120,
/// });
///
/// let traces = ctx.trace_snapshot();
/// assert_eq!(traces.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Shared metrics accumulator.
    metrics: Arc<Mutex<PipelineMetrics>>,
    /// Shared trace log for structured pipeline events.
    traces: Arc<Mutex<Vec<TraceEntry>>>,
}

impl ExecutionContext {
    /// Create a new execution context with empty metrics and traces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completion attempt's prompt/response sizes.
    pub fn record_call(&self, prompt_bytes: usize, response_bytes: usize) {
        let mut m = self.metrics.lock().unwrap();
        m.add_call(prompt_bytes, response_bytes);
    }

    /// Record a retried completion attempt.
    pub fn record_retry(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_retry();
    }

    /// Increment the steps completed counter.
    pub fn record_step(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_step();
    }

    /// Record a failure message.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut m = self.metrics.lock().unwrap();
        m.record_failure(error.into());
    }

    /// Get a snapshot of the current metrics.
    #[must_use]
    pub fn metrics_snapshot(&self) -> PipelineMetrics {
        let m = self.metrics.lock().unwrap();
        m.clone()
    }

    /// Emit a structured pipeline event to the trace log.
    ///
    /// Events are timestamped automatically when emitted.
    pub fn emit(&self, event: PipelineEvent) {
        let entry = TraceEntry::new(event);
        self.traces.lock().unwrap().push(entry);
    }

    /// Get a snapshot of the current trace log.
    ///
    /// Returns all trace entries recorded so far. Useful for debugging
    /// or asserting on execution order in tests.
    #[must_use]
    pub fn trace_snapshot(&self) -> Vec<TraceEntry> {
        self.traces.lock().unwrap().clone()
    }

    /// Clear all trace entries.
    ///
    /// Useful when reusing a context across multiple pipeline runs.
    pub fn clear_traces(&self) {
        self.traces.lock().unwrap().clear();
    }
}
