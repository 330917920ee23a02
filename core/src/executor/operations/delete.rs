use std::path::PathBuf;

use tracing::{debug, info};

use super::{Target, record};
use crate::executor::{ExecutionContext, ExecutionError, ExecutionResult, StatementReport};

pub(super) async fn execute(
    ctx: &ExecutionContext,
    target: Target,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report = StatementReport::new("DELETE", &ctx.root, matches);
    info!(matched = report.matched, "[DELETE] {}", report.matched);

    for path in matches {
        debug!(path = %path.display(), "Removing");
        let removed = match target {
            Target::Folders => tokio::fs::remove_dir_all(path).await,
            Target::Files => tokio::fs::remove_file(path).await,
        };

        record(
            &mut report,
            &ctx.root,
            path,
            removed.map_err(|e| ExecutionError::io(path, e)),
        )?;
    }

    Ok(report)
}
