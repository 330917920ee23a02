use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use super::archive::zip_error;
use super::{Action, Target, has_extension, record, reject_same_location};
use crate::executor::{
    ExecutionContext, ExecutionError, ExecutionResult, StatementReport, ValidationError,
    ValidationResult,
};
use crate::ql::ast::TransferStmt;

pub(super) fn validate(target: Target, stmt: &TransferStmt) -> ValidationResult<Action> {
    if target == Target::Folders {
        return Err(ValidationError::FoldersNotAllowed {
            operation: "UNARCHIVE",
        });
    }

    if has_extension(&stmt.to) {
        return Err(ValidationError::DestinationNotDirectory {
            operation: "UNARCHIVE",
            to: stmt.to.clone(),
        });
    }

    reject_same_location("UNARCHIVE", stmt)?;

    Ok(Action::Unarchive {
        to: stmt.to.clone(),
    })
}

/// Extracts the `.zip` matches into `to`; other matches are left alone.
pub(super) async fn execute(
    ctx: &ExecutionContext,
    to: &str,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report = StatementReport::new("UNARCHIVE", &ctx.root, matches).with_destination(to);

    let (archives, others): (Vec<&PathBuf>, Vec<&PathBuf>) = matches
        .iter()
        .partition(|p| p.extension().is_some_and(|ext| ext == "zip"));

    for path in others {
        debug!(path = %path.display(), "Not a zip archive");
        report.skip(&ctx.root, path);
    }

    info!(archives = archives.len(), "[UNARCHIVE] {} to {}", archives.len(), to);

    if archives.is_empty() {
        return Ok(report);
    }

    let destination = ctx.root.join(to);
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| ExecutionError::io(&destination, e))?;

    for path in archives {
        let source = path.clone();
        let target = destination.clone();

        let extracted = tokio::task::spawn_blocking(move || extract(&source, &target))
            .await
            .map_err(|e| ExecutionError::Task(e.to_string()))?;

        record(&mut report, &ctx.root, path, extracted)?;
    }

    Ok(report)
}

fn extract(archive: &Path, destination: &Path) -> ExecutionResult<()> {
    let file = File::open(archive).map_err(|e| ExecutionError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| zip_error(archive, e))?;
    zip.extract(destination).map_err(|e| zip_error(archive, e))
}
