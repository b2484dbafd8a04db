use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("Ring capacity must be a non-zero power of two, got {0}")]
    InvalidCapacity(usize),

    #[error("Dispatcher is shut down")]
    ShutDown,

    #[error("Dispatcher consumer thread has stopped; ring is permanently full")]
    ConsumerStopped,

    #[error("Failed to spawn consumer thread: {0}")]
    Spawn(String),
}

pub type Result<T> = std::result::Result<T, DispatcherError>;
