//! Error types for pipeline execution.

use thiserror::Error;

use crate::client::CompletionError;
use crate::state::StateField;

/// The main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Environment configuration was missing or invalid at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A step's required input field was absent from the workflow state.
    ///
    /// This is a precondition failure: the orchestrator halts immediately
    /// and the failing step is never invoked. No retry applies.
    #[error("Missing required field '{field}' in workflow state before step '{step}'")]
    MissingField {
        /// The step whose precondition failed.
        step: String,
        /// The state field that was absent.
        field: StateField,
    },

    /// The context source could not be read.
    #[error("Failed to read context source '{path}': {source}")]
    ContextSource {
        /// Path of the context resource.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A completion call failed after the retry policy was exhausted.
    #[error("Step '{step}' execution failed: {source}")]
    StepExecution {
        /// The step whose completion call failed.
        step: String,
        /// The last error observed before giving up.
        #[source]
        source: CompletionError,
    },

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error on the interactive entry path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
