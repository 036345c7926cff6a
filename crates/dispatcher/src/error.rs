//! Dispatch error definitions

use contracts::ContractError;
use thiserror::Error;

/// Errors produced by one dispatch cycle
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Raw message carries no usable event-name attribute
    #[error("malformed message: {message}")]
    MalformedMessage { message: String },

    /// Immediate handler returned an error during synchronous execution
    #[error("handler '{handler}' failed for event '{event}': {source}")]
    HandlerInvocation {
        event: String,
        handler: String,
        #[source]
        source: anyhow::Error,
    },

    /// Deferred backend rejected the task submission
    #[error("task '{task}' submission failed for event '{event}': {source}")]
    TaskSubmission {
        event: String,
        task: String,
        #[source]
        source: ContractError,
    },

    /// Contract-level error
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DispatchError {
    /// Create a malformed-message error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }
}

/// Crossing the delivery callback boundary flattens the dispatch error
/// into the contract-level `Dispatch` variant, preserving the display
/// chain in the message.
impl From<DispatchError> for ContractError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Contract(inner) => inner,
            other => ContractError::Dispatch {
                message: other.to_string(),
            },
        }
    }
}
