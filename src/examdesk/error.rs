use crate::model::Partition;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExamError {
    /// The host refused persistent storage (missing/unwritable root, newer schema, corruption).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Partition not found: {0}")]
    PartitionNotFound(Partition),

    #[error("Corrupt record in {partition}: {reason}")]
    CorruptRecord {
        partition: Partition,
        reason: String,
    },

    #[error("Invalid question set: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No question set found")]
    NoQuestionSet,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExamError {
    /// Maps an I/O failure onto the store taxonomy: permission problems are
    /// `AccessDenied`, everything else stays a plain I/O error.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ExamError::AccessDenied(err.to_string()),
            _ => ExamError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExamError>;
