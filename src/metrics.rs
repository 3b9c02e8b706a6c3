//! Metrics collection for pipeline execution.
//!
//! This module provides `PipelineMetrics` for tracking completion-call
//! volume, retries, execution statistics, and failures.

use serde::{Deserialize, Serialize};

/// Aggregated metrics for a pipeline execution.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Number of pipeline steps completed successfully.
    pub steps_completed: usize,
    /// Number of completion calls attempted, including retries.
    pub completion_calls: usize,
    /// Number of retried attempts across all steps.
    pub retries: usize,
    /// Total bytes of prompt text sent across all steps.
    pub prompt_bytes: usize,
    /// Total bytes of response text received across all steps.
    pub response_bytes: usize,
    /// Collected failure messages from the pipeline.
    pub failures: Vec<String>,
}

impl PipelineMetrics {
    /// Record one completion attempt's prompt/response sizes.
    pub fn add_call(&mut self, prompt_bytes: usize, response_bytes: usize) {
        self.completion_calls += 1;
        self.prompt_bytes += prompt_bytes;
        self.response_bytes += response_bytes;
    }

    /// Record a retried attempt.
    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Record a failure message.
    pub fn record_failure(&mut self, error: String) {
        self.failures.push(error);
    }

    /// Increment the steps completed counter.
    pub fn record_step(&mut self) {
        self.steps_completed += 1;
    }

    /// Check if there were any failures.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
