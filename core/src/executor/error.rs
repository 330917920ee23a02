use std::path::PathBuf;

use thiserror::Error;

/// Semantic problems detected before a statement touches the file system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported target: '{0}', expected 'files' or 'folders'")]
    UnsupportedTarget(String),

    #[error("[{operation}] Cannot use the source '{location}' as destination")]
    SameLocation {
        operation: &'static str,
        location: String,
    },

    #[error("[{operation}] Destination must be a file, got directory '{to}'")]
    DestinationNotFile { operation: &'static str, to: String },

    #[error("[{operation}] Destination must be a directory, got file '{to}'")]
    DestinationNotDirectory { operation: &'static str, to: String },

    #[error("[{operation}] Invalid target: 'folders', must be 'files'")]
    FoldersNotAllowed { operation: &'static str },

    #[error("[CONVERT] Cannot convert to the same format: '{0}'")]
    SameFormat(String),

    #[error("[CONVERT] Invalid format: '{0}'")]
    UnsupportedFormat(String),

    #[error("[{operation}] Path must stay inside the query directory: '{path}'")]
    OutsideDirectory { operation: &'static str, path: String },

    #[error("Invalid WHERE clause: {0}")]
    InvalidPredicate(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported property: '{0}'")]
    UnsupportedProperty(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid value '{value}' for property '{property}'")]
    InvalidValue { property: String, value: String },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Archive error at {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ExecutionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExecutionError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error only says that a path disappeared.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExecutionError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
