use thiserror::Error;

/// Errors raised by provider adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider {0} is not connected")]
    NotConnected(String),

    #[error("Provider {provider} rejected the request: {reason}")]
    Rejected { provider: String, reason: String },

    #[error("Unsupported operation for provider {provider}: {operation}")]
    Unsupported { provider: String, operation: String },

    #[error("An event listener is already attached to provider {0}")]
    ListenerAlreadyAttached(String),

    #[error("Provider error: {0}")]
    Other(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
