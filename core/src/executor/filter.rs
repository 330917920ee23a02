use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::evaluator::Evaluator;
use super::operations::ValidatedStatement;
use super::{ExecutionError, ExecutionResult};

const IGNORED: &str = ".DS_Store";

/// Lists the immediate entries of a statement's `FROM` directory that match
/// its target kind and WHERE clause.
pub struct Filter {
    root: PathBuf,
}

impl Filter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn apply(&self, statement: &ValidatedStatement) -> ExecutionResult<Vec<PathBuf>> {
        let directory = self.root.join(&statement.from);

        match tokio::fs::metadata(&directory).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(ExecutionError::NotADirectory(directory)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExecutionError::DirectoryNotFound(directory));
            }
            Err(e) => return Err(ExecutionError::io(directory, e)),
        }

        let mut entries = tokio::fs::read_dir(&directory)
            .await
            .map_err(|e| ExecutionError::io(&directory, e))?;

        let mut matches = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ExecutionError::io(&directory, e))?
        {
            if entry.file_name() == IGNORED {
                continue;
            }

            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Entry vanished before it could be inspected");
                    continue;
                }
                Err(e) => return Err(ExecutionError::io(&path, e)),
            };

            if accepts(statement, &path, &file_type).await? {
                matches.push(path);
            }
        }

        debug!(directory = %directory.display(), matched = matches.len(), "Filtered directory");
        Ok(matches)
    }
}

// The entry's own type, not its symlink target's.
async fn accepts(
    statement: &ValidatedStatement,
    path: &Path,
    file_type: &FileType,
) -> ExecutionResult<bool> {
    if !statement.target.accepts(file_type) {
        return Ok(false);
    }

    let Some(condition) = &statement.where_clause else {
        return Ok(true);
    };

    match Evaluator::evaluate(condition, path).await {
        Err(e) if e.is_not_found() => {
            debug!(path = %path.display(), "Entry vanished during evaluation");
            Ok(false)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::operations::{Action, Target};
    use crate::ql::ast::{BinaryOp, Expression};

    fn statement(target: Target, from: &str, where_clause: Option<Expression>) -> ValidatedStatement {
        ValidatedStatement {
            target,
            from: from.to_string(),
            where_clause,
            action: Action::Select,
        }
    }

    fn names(paths: Vec<PathBuf>) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_kind_filtering() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let filter = Filter::new(dir.path());

        let files = filter.apply(&statement(Target::Files, "", None)).await.unwrap();
        assert_eq!(names(files), vec!["a.txt"]);

        let folders = filter.apply(&statement(Target::Folders, "", None)).await.unwrap();
        assert_eq!(names(folders), vec!["nested"]);
    }

    #[tokio::test]
    async fn test_ds_store_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();

        let files = Filter::new(dir.path())
            .apply(&statement(Target::Files, "", None))
            .await
            .unwrap();
        assert_eq!(names(files), vec![".hidden"]);
    }

    #[tokio::test]
    async fn test_listing_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/deep.txt"), "").unwrap();
        std::fs::write(dir.path().join("top.txt"), "").unwrap();

        let filter = Filter::new(dir.path());
        let root = filter.apply(&statement(Target::Files, "", None)).await.unwrap();
        assert_eq!(names(root), vec!["top.txt"]);

        let sub = filter.apply(&statement(Target::Files, "sub", None)).await.unwrap();
        assert_eq!(names(sub), vec!["deep.txt"]);
    }

    #[tokio::test]
    async fn test_where_clause_applies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.md"), "").unwrap();
        std::fs::write(dir.path().join("drop.txt"), "").unwrap();

        let condition = Expression::binary(
            BinaryOp::Eq,
            Expression::Literal("extension".to_string()),
            Expression::Literal("^md$".to_string()),
        );
        let files = Filter::new(dir.path())
            .apply(&statement(Target::Files, "", Some(condition)))
            .await
            .unwrap();
        assert_eq!(names(files), vec!["keep.md"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_neither_files_nor_folders() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("real.txt"), "r").unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linkdir")).unwrap();

        let filter = Filter::new(dir.path());

        let files = filter.apply(&statement(Target::Files, "", None)).await.unwrap();
        assert_eq!(names(files), vec!["real.txt"]);

        let folders = filter.apply(&statement(Target::Folders, "", None)).await.unwrap();
        assert_eq!(names(folders), vec!["real"]);
    }

    #[tokio::test]
    async fn test_entry_vanishing_during_evaluation_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.txt");
        std::fs::write(&gone, "g").unwrap();
        let file_type = std::fs::symlink_metadata(&gone).unwrap().file_type();
        std::fs::remove_file(&gone).unwrap();

        let condition = Expression::binary(
            BinaryOp::Gt,
            Expression::Literal("size".to_string()),
            Expression::Literal("0".to_string()),
        );
        let stmt = statement(Target::Files, "", Some(condition));

        assert!(!accepts(&stmt, &gone, &file_type).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Filter::new(dir.path())
            .apply(&statement(Target::Files, "nope", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::DirectoryNotFound(path) if path.ends_with("nope")));
    }

    #[tokio::test]
    async fn test_from_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "").unwrap();
        let err = Filter::new(dir.path())
            .apply(&statement(Target::Files, "file.txt", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotADirectory(_)));
    }
}
