//! SortQL - declarative bulk file operations

pub mod convert;
pub mod error;
pub mod executor;
pub mod ql;

pub use convert::{ConversionError, Converter, MediaFormat, MediaKind, Unconfigured};
pub use error::{SortError, SortResult};
pub use executor::{Engine, RunReport, StatementOutcome, StatementReport, StatementResult};
pub use ql::Query;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

/// Entry point for running query text against one directory.
///
/// A client keeps no state between runs; callers that trigger runs
/// repeatedly are responsible for keeping them from overlapping.
pub struct Client {
    directory: PathBuf,
    engine: Engine,
}

impl Client {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_converter(directory, Arc::new(Unconfigured))
    }

    pub fn with_converter(directory: impl Into<PathBuf>, converter: Arc<dyn Converter>) -> Self {
        Self {
            directory: directory.into(),
            engine: Engine::new(converter),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn parse(&self, content: &str) -> SortResult<Query> {
        Ok(ql::parse(content, &self.directory)?)
    }

    /// Parses `content` and runs every statement in order. A parse error
    /// means nothing runs; statement failures are inside the report.
    pub async fn run(&self, content: &str) -> SortResult<RunReport> {
        info!(directory = %self.directory.display(), "Parsing queries");
        let query = self.parse(content)?;
        debug!(statements = query.statements.len(), "Parsed queries");

        let report = self.engine.execute(&query).await;
        info!(
            statements = report.statements.len(),
            failed = report.has_failures(),
            "Queries executed"
        );

        Ok(report)
    }

    pub async fn run_file(&self, path: impl AsRef<Path>) -> SortResult<RunReport> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        self.run(&content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_error_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let client = Client::new(dir.path());
        let err = client
            .run("DELETE 'files' FROM ''; SELECT 'files'")
            .await
            .unwrap_err();

        assert!(matches!(err, SortError::Parse(ql::Error::SyntaxError(_))));
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_run_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        let queries = dir.path().join("queries.sql");
        std::fs::write(&queries, "-- everything\nSELECT 'files' FROM ''").unwrap();

        let report = Client::new(dir.path()).run_file(&queries).await.unwrap();
        match &report.statements[0].outcome {
            StatementOutcome::Completed(select) => assert_eq!(select.matched, 2),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_queries_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Client::new(dir.path())
            .run_file(dir.path().join("missing.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, SortError::Io(_)));
    }
}
