//! Error types for the engine crate

use hermes_dispatcher::DispatcherError;
use hermes_gateway::GatewayError;
use hermes_ports::ProviderError;
use hermes_session::SessionError;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Dispatcher error: {0}")]
    Dispatcher(#[from] DispatcherError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Provider '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("Engine server is already running")]
    AlreadyRunning,

    #[error("Engine server was stopped and cannot be restarted")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, EngineError>;
