mod engine;
mod error;
mod evaluator;
mod filter;
pub mod operations;
mod properties;
mod result;


pub use engine::Engine;
pub use error::{ExecutionError, ExecutionResult, ValidationError, ValidationResult};
pub use evaluator::Evaluator;
pub use filter::Filter;
pub use operations::{Action, Target, ValidatedStatement};
pub use properties::{FileProperties, Property, PropertyValue, ValueType, parse_timestamp};
pub use result::{PathFailure, RunReport, StatementOutcome, StatementReport, StatementResult};

use std::path::PathBuf;
use std::sync::Arc;

use crate::convert::Converter;

/// Everything an operation needs besides the statement itself.
pub struct ExecutionContext {
    pub root: PathBuf,
    pub converter: Arc<dyn Converter>,
}

impl ExecutionContext {
    pub fn new(root: impl Into<PathBuf>, converter: Arc<dyn Converter>) -> Self {
        Self {
            root: root.into(),
            converter,
        }
    }
}
