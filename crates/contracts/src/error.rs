//! Layered error definitions
//!
//! Categorized by source: config / transport / task backend / general

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Subscription setup error
    #[error("subscribe error for topic '{topic}': {message}")]
    Subscribe { topic: String, message: String },

    /// Dispatch failure surfaced across the delivery callback boundary
    #[error("dispatch error: {message}")]
    Dispatch { message: String },

    // ===== Task Backend Errors =====
    /// Deferred backend rejected or could not accept a task
    #[error("task submission error for '{task}': {message}")]
    TaskSubmission { task: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create subscription setup error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create task submission error
    pub fn task_submission(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskSubmission {
            task: task.into(),
            message: message.into(),
        }
    }
}
