//! Answer step: answers the question from the context summary.

use async_trait::async_trait;

use super::PipelineStep;
use crate::state::{StateField, StateUpdate, WorkflowState};
use crate::{ExecutionContext, Result, StepExecutor};

/// Produces `answer` from `summary` and `question` through the completion
/// provider.
#[derive(Debug, Default)]
pub struct AnswerStep;

impl AnswerStep {
    /// Create an answer step.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineStep for AnswerStep {
    fn name(&self) -> &'static str {
        "answer"
    }

    fn requires(&self) -> &'static [StateField] {
        &[StateField::Summary, StateField::Question]
    }

    fn produces(&self) -> &'static [StateField] {
        &[StateField::Answer]
    }

    async fn run(
        &self,
        ctx: &ExecutionContext,
        executor: &StepExecutor,
        state: &WorkflowState,
    ) -> Result<StateUpdate> {
        let summary = state.require(StateField::Summary, self.name())?;
        let question = state.require(StateField::Question, self.name())?;
        let prompt = format!("Context Summary:\n{summary}\n\nQuestion: {question}");
        let answer = executor.execute(ctx, self.name(), &prompt).await?;
        Ok(StateUpdate::answer(answer))
    }
}
