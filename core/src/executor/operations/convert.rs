use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::{Action, Target};
use crate::convert::MediaFormat;
use crate::executor::{
    ExecutionContext, ExecutionResult, StatementReport, ValidationError, ValidationResult,
};
use crate::ql::ast::TransferStmt;

pub(super) fn validate(target: Target, stmt: &TransferStmt) -> ValidationResult<Action> {
    if target != Target::Files {
        return Err(ValidationError::FoldersNotAllowed {
            operation: "CONVERT",
        });
    }

    if stmt.selection.from == stmt.to {
        return Err(ValidationError::SameFormat(stmt.to.clone()));
    }

    let format = MediaFormat::parse(&stmt.to)
        .ok_or_else(|| ValidationError::UnsupportedFormat(stmt.to.clone()))?;

    Ok(Action::Convert { format })
}

/// Converts every match next to its source. Conversions run concurrently
/// and a failed file never cancels the others.
pub(super) async fn execute(
    ctx: &ExecutionContext,
    format: &MediaFormat,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report =
        StatementReport::new("CONVERT", &ctx.root, matches).with_destination(format.extension());
    info!(matched = report.matched, "[CONVERT] {} to {}", report.matched, format);

    let mut jobs = Vec::with_capacity(matches.len());
    for path in matches {
        if is_format(path, format) {
            warn!(path = %path.display(), format = %format, "Already in the target format");
            report.skip(&ctx.root, path);
            continue;
        }

        jobs.push((path.as_path(), output_path(path, format)));
    }

    let results = join_all(jobs.iter().map(|(input, output)| {
        debug!(input = %input.display(), output = %output.display(), "Converting");
        ctx.converter.convert(input, output, format.kind())
    }))
    .await;

    for ((input, _), result) in jobs.iter().zip(results) {
        match result {
            Ok(()) => report.processed += 1,
            Err(e) => {
                error!(path = %input.display(), error = %e, "[CONVERT] Conversion failed");
                report.fail(&ctx.root, input, e);
            }
        }
    }

    Ok(report)
}

fn is_format(path: &Path, format: &MediaFormat) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(format.extension()))
}

/// `<folder>/<name up to the first dot>.<format>`
fn output_path(input: &Path, format: &MediaFormat) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem,
        _ => name.as_str(),
    };

    input
        .with_file_name(format!("{}.{}", stem, format.extension()))
}
