use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use super::{ExecutionError, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What one statement did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementReport {
    pub operation: &'static str,
    pub destination: Option<String>,
    pub matched: usize,
    /// Matched entries relative to the query root, in listing order.
    pub paths: Vec<PathBuf>,
    pub processed: usize,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<PathFailure>,
}

impl StatementReport {
    pub fn new(operation: &'static str, root: &Path, matches: &[PathBuf]) -> Self {
        Self {
            operation,
            destination: None,
            matched: matches.len(),
            paths: matches.iter().map(|p| relative(root, p)).collect(),
            processed: 0,
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn skip(&mut self, root: &Path, path: &Path) {
        self.skipped.push(relative(root, path));
    }

    pub fn fail(&mut self, root: &Path, path: &Path, reason: impl Display) {
        self.failures.push(PathFailure {
            path: relative(root, path),
            reason: reason.to_string(),
        });
    }
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StatementOutcome {
    Completed(StatementReport),
    Rejected(#[serde(serialize_with = "as_message")] ValidationError),
    Failed(#[serde(serialize_with = "as_message")] ExecutionError),
}

fn as_message<E: Display, S: Serializer>(error: &E, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Serialize)]
pub struct StatementResult {
    /// The statement as written back in query syntax.
    pub statement: String,
    pub outcome: StatementOutcome,
}

impl StatementResult {
    pub fn is_failure(&self) -> bool {
        match &self.outcome {
            StatementOutcome::Completed(report) => !report.failures.is_empty(),
            StatementOutcome::Rejected(_) | StatementOutcome::Failed(_) => true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub directory: PathBuf,
    pub statements: Vec<StatementResult>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.statements.iter().any(StatementResult::is_failure)
    }
}
