//! Pipeline step trait and the three concrete steps.
//!
//! A step is a named unit with a required-input contract, a produced-output
//! contract, and an async execution function over the shared workflow
//! state. Steps are constructed once at startup and are stateless across
//! invocations; completion calls go through the shared
//! [`StepExecutor`](crate::StepExecutor).

use async_trait::async_trait;

use crate::state::{StateField, StateUpdate, WorkflowState};
use crate::{ExecutionContext, Result, StepExecutor};

pub mod answer;
pub mod retrieve;
pub mod summarize;

pub use answer::AnswerStep;
pub use retrieve::RetrieveStep;
pub use summarize::SummarizeStep;

/// One named unit of the pipeline.
///
/// The orchestrator validates [`requires`](PipelineStep::requires) against
/// the current state before invoking [`run`](PipelineStep::run), so an
/// implementation may assume its declared inputs are present.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// The step's name, used for tracing and log correlation.
    fn name(&self) -> &'static str;

    /// State fields that must be present before this step runs.
    fn requires(&self) -> &'static [StateField];

    /// State fields this step produces.
    fn produces(&self) -> &'static [StateField];

    /// Execute the step, returning the output slice to merge into state.
    async fn run(
        &self,
        ctx: &ExecutionContext,
        executor: &StepExecutor,
        state: &WorkflowState,
    ) -> Result<StateUpdate>;
}
