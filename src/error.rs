//! Error types for the games room persistence layer

use thiserror::Error;

/// Message attached to failures raised while writing records
pub const UPSERT_FAILED: &str = "An exception occurred while upserting a record.";

/// Message attached to any other wrapped store failure
pub const PERSISTENCE_EXCEPTION: &str = "Persistence exception";

pub const ENTITY_MUST_NOT_BE_EMPTY: &str = "Entity must not be empty.";

pub const DEFINE_ENTITY_COLUMNS: &str = "Define the entity with proper column descriptors";

/// Stable error codes reported alongside logged failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    InvalidArgument = 2,
    SchemaError = 3,
    DbFailure = 4,
    PersistenceFailure = 5,
    NoSuchRecord = 6,
    BadValue = 7,
}

/// Failure while reading a record's values into statement parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("column {column} is declared non-null but the value is missing")]
    NullValue { column: &'static str },

    #[error("composite identifier {field} is not set")]
    MissingIdentifier { field: &'static str },
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("{message}")]
    Persistence {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a lower-level failure as a persistence failure
    pub fn persistence<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::Persistence {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AppError::Schema(_) => ErrorCode::SchemaError,
            AppError::Persistence { .. } => ErrorCode::PersistenceFailure,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::NotFound(_) => ErrorCode::NoSuchRecord,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// Connection-level failures that callers are expected to handle
    /// themselves (retry, fail over) rather than treat as a bad write.
    pub fn is_data_access_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

/// Result type alias for persistence operations
pub type AppResult<T> = Result<T, AppError>;
