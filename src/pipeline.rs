//! Pipeline orchestrator: strict sequential step execution.
//!
//! The orchestrator holds the ordered step list, validates each step's
//! required-field contract against the current state, runs the step, and
//! merges its output slice back into the state. Execution is strictly
//! sequential: no step is skipped, reordered, or run concurrently, and a
//! step can never observe a later step's output. The first unrecovered
//! failure aborts the run with no rollback.

use std::time::Instant;

use crate::logger::StepLogger;
use crate::state::WorkflowState;
use crate::step::PipelineStep;
use crate::{Error, ExecutionContext, PipelineEvent, Result, StepExecutor};

/// Drives an ordered list of steps over a shared workflow state.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    executor: StepExecutor,
    logger: StepLogger,
}

impl Pipeline {
    /// Create an empty pipeline over the given executor and step logger.
    #[must_use]
    pub fn new(executor: StepExecutor, logger: StepLogger) -> Self {
        Self {
            steps: Vec::new(),
            executor,
            logger,
        }
    }

    /// Append a step to the end of the fixed sequence.
    #[must_use]
    pub fn with_step(mut self, step: impl PipelineStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Names of the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline to completion with a fresh execution context.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error: a missing required field, a
    /// context-source read failure, or a completion call whose retries
    /// were exhausted. State is not rolled back on failure.
    pub async fn run(&self, initial_state: WorkflowState) -> Result<WorkflowState> {
        let ctx = ExecutionContext::new();
        self.run_with_ctx(&ctx, initial_state).await
    }

    /// Run the pipeline with a caller-provided execution context.
    ///
    /// Useful for sharing metrics and traces across runs, or for
    /// inspecting the trace log after a run.
    pub async fn run_with_ctx(
        &self,
        ctx: &ExecutionContext,
        initial_state: WorkflowState,
    ) -> Result<WorkflowState> {
        let mut state = initial_state;

        for step in &self.steps {
            let name = step.name();
            for field in step.requires() {
                if state.get(*field).is_none() {
                    let err = Error::MissingField {
                        step: name.to_string(),
                        field: *field,
                    };
                    ctx.record_failure(err.to_string());
                    ctx.emit(PipelineEvent::Error {
                        step_name: name.to_string(),
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            }

            let inputs = state.snapshot(step.requires());
            ctx.emit(PipelineEvent::StepStart {
                step_name: name.to_string(),
                inputs: inputs.clone(),
            });

            let start = Instant::now();
            let update = match step.run(ctx, &self.executor, &state).await {
                Ok(update) => update,
                Err(err) => {
                    ctx.record_failure(err.to_string());
                    ctx.emit(PipelineEvent::Error {
                        step_name: name.to_string(),
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            };
            let duration_ms = start.elapsed().as_millis();

            let outputs = serde_json::to_value(&update)?;
            self.logger.log_step(name, &inputs, &outputs);
            state.apply(update);

            ctx.record_step();
            ctx.emit(PipelineEvent::StepEnd {
                step_name: name.to_string(),
                duration_ms,
            });
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CompletionClient, CompletionError};
    use crate::logger::StepRecord;
    use crate::retry::RetryPolicy;
    use crate::step::{AnswerStep, RetrieveStep, SummarizeStep};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Deterministic stub provider: echoes a fixed transform of the prompt,
    /// optionally failing the first `fail_first` calls transiently.
    struct StubClient {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl StubClient {
        fn new() -> Self {
            Self::flaky(0)
        }

        fn flaky(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err(CompletionError::Http("connection refused".to_string()));
            }
            if prompt.starts_with("Summarize") {
                Ok("a fixed summary".to_string())
            } else {
                Ok("a fixed answer".to_string())
            }
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn context_file(tag: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "qa_pipeline_ctx_{tag}_{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "Rust is a systems programming language.").unwrap();
        path
    }

    fn full_pipeline(client: Arc<StubClient>, ctx_path: &std::path::Path, logger: StepLogger) -> Pipeline {
        let executor = StepExecutor::new(client, RetryPolicy::immediate(3));
        Pipeline::new(executor, logger)
            .with_step(RetrieveStep::new(ctx_path.to_string_lossy()))
            .with_step(SummarizeStep::new())
            .with_step(AnswerStep::new())
    }

    #[tokio::test]
    async fn test_end_to_end_fills_every_field() {
        let path = context_file("full");
        let pipeline = full_pipeline(Arc::new(StubClient::new()), &path, StepLogger::console_only());

        let ctx = ExecutionContext::new();
        let state = pipeline
            .run_with_ctx(&ctx, WorkflowState::new("What is Rust?"))
            .await
            .unwrap();

        assert!(!state.question.is_empty());
        assert!(!state.context.as_deref().unwrap().is_empty());
        assert!(!state.summary.as_deref().unwrap().is_empty());
        assert!(!state.answer.as_deref().unwrap().is_empty());
        assert_eq!(ctx.metrics_snapshot().steps_completed, 3);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_context_halts_before_answer() {
        let client = Arc::new(StubClient::new());
        let executor = StepExecutor::new(client.clone(), RetryPolicy::immediate(3));
        // No retrieve step: summarize's precondition cannot be satisfied.
        let pipeline = Pipeline::new(executor, StepLogger::console_only())
            .with_step(SummarizeStep::new())
            .with_step(AnswerStep::new());

        let ctx = ExecutionContext::new();
        let err = pipeline
            .run_with_ctx(&ctx, WorkflowState::new("What is Rust?"))
            .await
            .unwrap_err();

        match err {
            Error::MissingField { step, field } => {
                assert_eq!(step, "summarize");
                assert_eq!(field, crate::StateField::Context);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The provider was never reached, so the answer step never ran.
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(!ctx
            .trace_snapshot()
            .iter()
            .any(|e| matches!(&e.event, PipelineEvent::StepStart { step_name, .. } if step_name == "answer")));
    }

    #[tokio::test]
    async fn test_transient_failures_recover_within_policy() {
        let path = context_file("flaky");
        // First two completion attempts fail; the third succeeds.
        let client = Arc::new(StubClient::flaky(2));
        let pipeline = full_pipeline(client.clone(), &path, StepLogger::console_only());

        let ctx = ExecutionContext::new();
        let state = pipeline
            .run_with_ctx(&ctx, WorkflowState::new("What is Rust?"))
            .await
            .unwrap();

        assert_eq!(state.summary.as_deref(), Some("a fixed summary"));
        // 3 attempts for summarize, 1 for answer.
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
        assert_eq!(ctx.metrics_snapshot().retries, 2);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_halts_pipeline() {
        let path = context_file("exhaust");
        let client = Arc::new(StubClient::flaky(u32::MAX));
        let pipeline = full_pipeline(client.clone(), &path, StepLogger::console_only());

        let err = pipeline
            .run(WorkflowState::new("What is Rust?"))
            .await
            .unwrap_err();

        match err {
            Error::StepExecution { step, .. } => assert_eq!(step, "summarize"),
            other => panic!("unexpected error: {other:?}"),
        }
        // Exactly the summarize attempts; the answer step never executed.
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_deterministic_with_stubbed_provider() {
        let path = context_file("determinism");

        let run = || async {
            let pipeline =
                full_pipeline(Arc::new(StubClient::new()), &path, StepLogger::console_only());
            pipeline.run(WorkflowState::new("What is Rust?")).await.unwrap()
        };

        let first = run().await;
        let second = run().await;

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.answer, second.answer);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_one_log_record_per_step() {
        let path = context_file("logging");
        let log_path = std::env::temp_dir().join(format!(
            "qa_pipeline_steplog_{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&log_path);

        let pipeline = full_pipeline(
            Arc::new(StubClient::new()),
            &path,
            StepLogger::new(&log_path),
        );
        pipeline
            .run(WorkflowState::new("What is Rust?"))
            .await
            .unwrap();

        let text = std::fs::read_to_string(&log_path).unwrap();
        let records: Vec<StepRecord> = serde_json::Deserializer::from_str(&text)
            .into_iter::<StepRecord>()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].node, "retrieve");
        assert_eq!(records[1].node, "summarize");
        assert_eq!(records[2].node, "answer");
        // Inputs/outputs mirror the state slices passed and returned.
        assert_eq!(
            records[1].inputs["context"],
            "Rust is a systems programming language."
        );
        assert_eq!(records[1].outputs["summary"], "a fixed summary");
        assert_eq!(records[2].inputs["question"], "What is Rust?");
        assert_eq!(records[2].outputs["answer"], "a fixed answer");

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(&log_path);
    }
}
