use thiserror::Error;

/// Connect or join failed. Moves the controller into its error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("failed to connect user: {0}")]
    Connect(String),
    #[error("failed to join call '{call_id}': {message}")]
    Join { call_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is already {0}; tear it down before initializing again")]
    AlreadyActive(&'static str),
    #[error("session was torn down before it finished connecting")]
    TornDown,
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("session task failed: {0}")]
    Task(String),
}
