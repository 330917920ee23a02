use thiserror::Error;

use crate::ql;

pub type SortResult<T> = Result<T, SortError>;

/// Errors that abort a whole run. Statement-level failures are carried
/// inside the run report instead.
#[derive(Error, Debug)]
pub enum SortError {
    #[error("Parse error: {0}")]
    Parse(#[from] ql::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
