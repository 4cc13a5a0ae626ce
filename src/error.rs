use thiserror::Error;

/// Errors surfaced by the conversation core to the presentation layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoastError {
    /// Local validation failed; nothing was sent and nothing was stored.
    #[error("{0}")]
    InvalidInput(String),

    /// A target is already locked for this conversation.
    #[error("Already roasting '{0}'. Reset the conversation to pick a new target.")]
    TargetAlreadyBound(String),

    /// The remote completion call failed in any way (transport, status, body).
    #[error("Completion service failed: {0}")]
    CompletionService(String),

    /// Required configuration or credentials are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RoastError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Collapses a provider error chain into the single opaque service error.
    pub fn completion(err: &anyhow::Error) -> Self {
        Self::CompletionService(format!("{:#}", err))
    }

    /// Validation errors leave the session usable and are shown as warnings.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::TargetAlreadyBound(_))
    }
}

pub type Result<T> = std::result::Result<T, RoastError>;
