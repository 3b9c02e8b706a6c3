//! Step executor: one completion call wrapped with retry and tracing.
//!
//! The executor owns the shared completion client and the retry policy.
//! Steps build a prompt and call [`StepExecutor::execute`]; the executor
//! drives the call through [`retry_with_policy`], brackets it in a tracing
//! span carrying the model identifier, duration, and prompt/response
//! lengths, and records attempt-level metrics in the execution context.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::client::CompletionClient;
use crate::retry::{retry_with_policy, RetryPolicy};
use crate::{Error, ExecutionContext, PipelineEvent, Result};

/// Wraps a single unit of work (prompt → completion) with bounded retry
/// and duration measurement.
pub struct StepExecutor {
    client: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl StepExecutor {
    /// Create an executor over the given client and retry policy.
    pub fn new(client: Arc<dyn CompletionClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// The retry policy applied to every call.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform one completion call on behalf of `step_name`.
    ///
    /// Transient failures are retried per the policy; intermediate errors
    /// surface only as `Retry` events and warnings, and on exhaustion the
    /// final error propagates as [`Error::StepExecution`]. No partial
    /// result is ever returned.
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        step_name: &str,
        prompt: &str,
    ) -> Result<String> {
        let span = tracing::info_span!(
            "completion",
            step = step_name,
            model = self.client.model(),
            prompt_length = prompt.len(),
            duration_ms = tracing::field::Empty,
            response_length = tracing::field::Empty,
        );

        let start = Instant::now();
        let result = retry_with_policy(
            &self.policy,
            |_attempt| self.client.complete(prompt),
            |attempt, delay, err| {
                ctx.record_retry();
                ctx.emit(PipelineEvent::Retry {
                    step_name: step_name.to_string(),
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                });
                tracing::warn!(
                    step = step_name,
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "completion call failed, retrying"
                );
            },
        )
        .instrument(span.clone())
        .await;
        let duration_ms = start.elapsed().as_millis();

        match result {
            Ok(response) => {
                span.record("duration_ms", duration_ms as u64);
                span.record("response_length", response.len());
                ctx.record_call(prompt.len(), response.len());
                tracing::info!(
                    step = step_name,
                    model = self.client.model(),
                    duration_ms = duration_ms as u64,
                    prompt_length = prompt.len(),
                    response_length = response.len(),
                    "completion succeeded"
                );
                Ok(response)
            }
            Err(source) => {
                ctx.record_failure(source.to_string());
                Err(Error::StepExecution {
                    step: step_name.to_string(),
                    source,
                })
            }
        }
    }
}
