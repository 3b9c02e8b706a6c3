//! # qa-pipeline
//!
//! An observable three-step LLM pipeline in Rust: retrieve context,
//! summarize it, and answer a question — with bounded retry, span tracing,
//! and structured step logging.
//!
//! ## Core Concepts
//!
//! - **WorkflowState**: typed state record threaded through the pipeline
//! - **PipelineStep**: a named unit with required-input/produced-output contracts
//! - **StepExecutor**: wraps one completion call with retry and a trace span
//! - **RetryPolicy**: attempt count and exponential backoff parameters
//! - **Pipeline**: strict sequential orchestrator over the step list
//! - **StepLogger**: append-only JSON step log (file + console)
//! - **ExecutionContext**: shared metrics and structured event trace
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qa_pipeline::{
//!     AnswerStep, CompletionClient, CompletionError, Pipeline, RetrieveStep, RetryPolicy,
//!     StepExecutor, StepLogger, SummarizeStep, WorkflowState,
//! };
//!
//! struct FixedClient;
//!
//! #[async_trait::async_trait]
//! impl CompletionClient for FixedClient {
//!     async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
//!         Ok("a deterministic completion".to_string())
//!     }
//!     fn model(&self) -> &str {
//!         "fixed"
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let executor = StepExecutor::new(Arc::new(FixedClient), RetryPolicy::default());
//! let pipeline = Pipeline::new(executor, StepLogger::new("logs/pipeline_run.log"))
//!     .with_step(RetrieveStep::new("data/context.txt"))
//!     .with_step(SummarizeStep::new())
//!     .with_step(AnswerStep::new());
//!
//! let state = pipeline.run(WorkflowState::new("What is Rust?")).await.unwrap();
//! println!("{}", state.answer.unwrap());
//! # });
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod executor;
pub mod logger;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod state;
pub mod step;
pub mod telemetry;

pub use client::{CompletionClient, CompletionError, OpenAiClient, OpenAiClientConfig};
pub use config::PipelineConfig;
pub use context::ExecutionContext;
pub use error::{Error, Result};
pub use events::{PipelineEvent, TraceEntry};
pub use executor::StepExecutor;
pub use logger::{StepLogger, StepRecord};
pub use metrics::PipelineMetrics;
pub use pipeline::Pipeline;
pub use retry::{retry_with_policy, Retryable, RetryPolicy};
pub use state::{StateField, StateUpdate, WorkflowState};
pub use step::{AnswerStep, PipelineStep, RetrieveStep, SummarizeStep};
pub use telemetry::{init_telemetry, TelemetryGuard};
