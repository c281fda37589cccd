use thiserror::Error;

/// Errors raised by selectors, profiles and jobs.
///
/// All variants are local and synchronous; nothing here is retryable.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A required input (signal, surface, ...) was never provided.
    #[error("{0}")]
    Precondition(String),

    /// Input consistency checks failed. Every detected violation is listed.
    #[error("invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A value was requested that neither explicit arguments nor a live
    /// selector can supply.
    #[error("{0}")]
    State(String),

    /// Attempted to mutate a finished job.
    #[error("finished jobs cannot be changed: {0}")]
    Finished(String),

    /// Saving or loading a job snapshot failed.
    #[error(transparent)]
    Persistence(#[from] crate::persistence::PersistenceError),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
