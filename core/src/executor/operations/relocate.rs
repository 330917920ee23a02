use std::path::PathBuf;

use tracing::{debug, info};

use super::{Action, record, reject_same_location};
use crate::executor::{
    ExecutionContext, ExecutionError, ExecutionResult, StatementReport, ValidationResult,
};
use crate::ql::ast::TransferStmt;

pub(super) fn validate(stmt: &TransferStmt) -> ValidationResult<Action> {
    reject_same_location("MOVE", stmt)?;
    Ok(Action::Move {
        to: stmt.to.clone(),
    })
}

/// Renames every match into `to`, flattened to its basename.
pub(super) async fn execute(
    ctx: &ExecutionContext,
    to: &str,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report = StatementReport::new("MOVE", &ctx.root, matches).with_destination(to);

    if matches.is_empty() {
        info!("[MOVE] Nothing to move to {}", to);
        return Ok(report);
    }

    let destination = ctx.root.join(to);
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| ExecutionError::io(&destination, e))?;

    info!(matched = report.matched, destination = %destination.display(), "[MOVE] {} to {}", report.matched, to);

    for path in matches {
        let Some(name) = path.file_name() else {
            report.skip(&ctx.root, path);
            continue;
        };

        // A folder cannot be moved inside itself.
        if destination.starts_with(path) {
            debug!(path = %path.display(), "Skipping the destination itself");
            report.skip(&ctx.root, path);
            continue;
        }

        let target = destination.join(name);
        let moved = tokio::fs::rename(path, &target)
            .await
            .map_err(|e| ExecutionError::io(path, e));

        record(&mut report, &ctx.root, path, moved)?;
    }

    Ok(report)
}
