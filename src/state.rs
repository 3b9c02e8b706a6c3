//! Typed workflow state threaded through the pipeline.
//!
//! The state is a struct with one optional field per pipeline stage rather
//! than a dynamic string map. Each step declares the fields it requires and
//! produces via [`StateField`], and the orchestrator checks that contract at
//! every stage boundary before the step runs.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identity of one field in the workflow state.
///
/// Used by steps to declare their required-input and produced-output
/// contracts, and by [`Error::MissingField`] to name the violated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    /// The user's question, present from the start.
    Question,
    /// Raw context text produced by the retrieve step.
    Context,
    /// Condensed context produced by the summarize step.
    Summary,
    /// The final answer produced by the answer step.
    Answer,
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StateField::Question => "question",
            StateField::Context => "context",
            StateField::Summary => "summary",
            StateField::Answer => "answer",
        };
        f.write_str(name)
    }
}

/// The single mutable state record threaded through the entire pipeline.
///
/// `question` is always present; the remaining fields are filled in by
/// successive steps. A step may only read fields produced by an earlier step
/// in the fixed sequence — the orchestrator enforces this before each step
/// runs, so the required-field accessors here only fail if a step reads a
/// field it never declared.
///
/// # Example
///
/// ```rust
/// use qa_pipeline::{StateField, WorkflowState};
///
/// let mut state = WorkflowState::new("What is Rust?");
/// assert!(state.get(StateField::Context).is_none());
///
/// state.context = Some("Rust is a systems language.".to_string());
/// assert!(state.require(StateField::Context, "summarize").is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The question to answer.
    pub question: String,
    /// Context text, produced by the retrieve step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Context summary, produced by the summarize step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Final answer, produced by the answer step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl WorkflowState {
    /// Create an initial state containing only the question.
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: None,
            summary: None,
            answer: None,
        }
    }

    /// Get the value of a field, if present.
    #[must_use]
    pub fn get(&self, field: StateField) -> Option<&str> {
        match field {
            StateField::Question => Some(self.question.as_str()),
            StateField::Context => self.context.as_deref(),
            StateField::Summary => self.summary.as_deref(),
            StateField::Answer => self.answer.as_deref(),
        }
    }

    /// Get a field that `step` declared as required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent.
    pub fn require(&self, field: StateField, step: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| Error::MissingField {
            step: step.to_string(),
            field,
        })
    }

    /// Merge a step's output slice into the state.
    ///
    /// Fields set in the update overwrite any existing value of the same
    /// name; fields left `None` are untouched.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(context) = update.context {
            self.context = Some(context);
        }
        if let Some(summary) = update.summary {
            self.summary = Some(summary);
        }
        if let Some(answer) = update.answer {
            self.answer = Some(answer);
        }
    }

    /// Snapshot the named fields as a JSON object, for step logging.
    ///
    /// Absent fields are omitted from the snapshot rather than serialized
    /// as null.
    #[must_use]
    pub fn snapshot(&self, fields: &[StateField]) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for field in fields {
            if let Some(value) = self.get(*field) {
                map.insert(field.to_string(), serde_json::Value::from(value));
            }
        }
        serde_json::Value::Object(map)
    }
}

/// The output slice produced by one step invocation.
///
/// Returned by [`PipelineStep::run`](crate::step::PipelineStep::run) and
/// merged into [`WorkflowState`] by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    /// New context text, if this step produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// New summary, if this step produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// New answer, if this step produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl StateUpdate {
    /// An update that sets only the context field.
    #[must_use]
    pub fn context(value: impl Into<String>) -> Self {
        Self {
            context: Some(value.into()),
            ..Self::default()
        }
    }

    /// An update that sets only the summary field.
    #[must_use]
    pub fn summary(value: impl Into<String>) -> Self {
        Self {
            summary: Some(value.into()),
            ..Self::default()
        }
    }

    /// An update that sets only the answer field.
    #[must_use]
    pub fn answer(value: impl Into<String>) -> Self {
        Self {
            answer: Some(value.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present_field() {
        let state = WorkflowState::new("why?");
        assert_eq!(state.require(StateField::Question, "answer").unwrap(), "why?");
    }

    #[test]
    fn test_require_missing_field() {
        let state = WorkflowState::new("why?");
        let err = state.require(StateField::Summary, "answer").unwrap_err();
        match err {
            Error::MissingField { step, field } => {
                assert_eq!(step, "answer");
                assert_eq!(field, StateField::Summary);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_apply_overwrites_existing_field() {
        let mut state = WorkflowState::new("q");
        state.apply(StateUpdate::context("first"));
        state.apply(StateUpdate::context("second"));
        assert_eq!(state.context.as_deref(), Some("second"));
    }

    #[test]
    fn test_apply_leaves_unset_fields_untouched() {
        let mut state = WorkflowState::new("q");
        state.apply(StateUpdate::context("ctx"));
        state.apply(StateUpdate::summary("sum"));
        assert_eq!(state.context.as_deref(), Some("ctx"));
        assert_eq!(state.summary.as_deref(), Some("sum"));
        assert!(state.answer.is_none());
    }

    #[test]
    fn test_snapshot_omits_absent_fields() {
        let mut state = WorkflowState::new("q");
        state.apply(StateUpdate::context("ctx"));
        let snapshot = state.snapshot(&[StateField::Question, StateField::Summary, StateField::Context]);
        assert_eq!(snapshot["question"], "q");
        assert_eq!(snapshot["context"], "ctx");
        assert!(snapshot.get("summary").is_none());
    }
}
