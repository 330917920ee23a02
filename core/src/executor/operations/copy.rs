use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Action, record, reject_same_location};
use crate::executor::{
    ExecutionContext, ExecutionError, ExecutionResult, StatementReport, ValidationResult,
};
use crate::ql::ast::TransferStmt;

pub(super) fn validate(stmt: &TransferStmt) -> ValidationResult<Action> {
    reject_same_location("COPY", stmt)?;
    Ok(Action::Copy {
        to: stmt.to.clone(),
    })
}

pub(super) async fn execute(
    ctx: &ExecutionContext,
    to: &str,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report = StatementReport::new("COPY", &ctx.root, matches).with_destination(to);
    info!(matched = report.matched, "[COPY] {} to {}", report.matched, to);

    if matches.is_empty() {
        return Ok(report);
    }

    let destination = ctx.root.join(to);
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| ExecutionError::io(&destination, e))?;

    for path in matches {
        let Some(name) = path.file_name() else {
            report.skip(&ctx.root, path);
            continue;
        };

        if destination.starts_with(path) {
            debug!(path = %path.display(), "Skipping a folder that contains the destination");
            report.skip(&ctx.root, path);
            continue;
        }

        let target = destination.join(name);
        debug!(from = %path.display(), to = %target.display(), "Copying");

        let is_dir = tokio::fs::symlink_metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let copied = if is_dir {
            copy_tree(path.clone(), target).await
        } else {
            tokio::fs::copy(path, &target)
                .await
                .map(|_| ())
                .map_err(|e| ExecutionError::io(path, e))
        };

        record(&mut report, &ctx.root, path, copied)?;
    }

    Ok(report)
}

async fn copy_tree(source: PathBuf, target: PathBuf) -> ExecutionResult<()> {
    tokio::task::spawn_blocking(move || copy_tree_blocking(&source, &target))
        .await
        .map_err(|e| ExecutionError::Task(e.to_string()))?
}

fn copy_tree_blocking(source: &Path, target: &Path) -> ExecutionResult<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            match e.into_io_error() {
                Some(io) => ExecutionError::io(path, io),
                None => ExecutionError::io(path, std::io::Error::other("file system loop")),
            }
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)
                .map_err(|e| ExecutionError::io(&destination, e))?;
        } else {
            std::fs::copy(entry.path(), &destination)
                .map_err(|e| ExecutionError::io(entry.path(), e))?;
        }
    }

    Ok(())
}
