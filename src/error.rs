use std::path::PathBuf;
use thiserror::Error;

pub type PollResult<T> = Result<T, PollError>;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poll input: {0}")]
    Validation(#[from] ValidationError),

    #[error("poll not found: {0}")]
    NotFound(String),

    #[error("poll {0} has expired and no longer accepts votes")]
    Expired(String),

    #[error("none of the actor's roles are allowed (allowed: {})", .allowed.join(", "))]
    Permission { allowed: Vec<String> },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least 2 options are required, got {found}")]
    TooFewOptions { found: usize },

    #[error("duration must be a whole number of days, got {0:?}")]
    MalformedDuration(String),

    #[error("the question must not be empty")]
    EmptyQuestion,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PersistenceError::Json {
            path: path.into(),
            source,
        }
    }
}
