//! Summarize step: condenses the retrieved context via one completion call.

use async_trait::async_trait;

use super::PipelineStep;
use crate::state::{StateField, StateUpdate, WorkflowState};
use crate::{ExecutionContext, Result, StepExecutor};

/// Produces `summary` from `context` through the completion provider.
#[derive(Debug, Default)]
pub struct SummarizeStep;

impl SummarizeStep {
    /// Create a summarize step.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineStep for SummarizeStep {
    fn name(&self) -> &'static str {
        "summarize"
    }

    fn requires(&self) -> &'static [StateField] {
        &[StateField::Context]
    }

    fn produces(&self) -> &'static [StateField] {
        &[StateField::Summary]
    }

    async fn run(
        &self,
        ctx: &ExecutionContext,
        executor: &StepExecutor,
        state: &WorkflowState,
    ) -> Result<StateUpdate> {
        let context = state.require(StateField::Context, self.name())?;
        let prompt = format!("Summarize the following text:\n\n{context}");
        let summary = executor.execute(ctx, self.name(), &prompt).await?;
        Ok(StateUpdate::summary(summary))
    }
}
