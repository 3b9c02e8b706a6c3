//! Retrieve step: loads context text from a readable resource.

use async_trait::async_trait;

use super::PipelineStep;
use crate::state::{StateField, StateUpdate, WorkflowState};
use crate::{Error, ExecutionContext, Result, StepExecutor};

/// Loads the configured context file verbatim into the `context` field.
///
/// This step performs no model call; its only failure mode is a read error
/// on the context source.
pub struct RetrieveStep {
    path: String,
}

impl RetrieveStep {
    /// Create a retrieve step reading from `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PipelineStep for RetrieveStep {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn requires(&self) -> &'static [StateField] {
        &[]
    }

    fn produces(&self) -> &'static [StateField] {
        &[StateField::Context]
    }

    async fn run(
        &self,
        _ctx: &ExecutionContext,
        _executor: &StepExecutor,
        _state: &WorkflowState,
    ) -> Result<StateUpdate> {
        let context = std::fs::read_to_string(&self.path).map_err(|source| Error::ContextSource {
            path: self.path.clone(),
            source,
        })?;
        Ok(StateUpdate::context(context))
    }
}
