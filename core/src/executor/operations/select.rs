use std::path::PathBuf;

use tracing::info;

use crate::executor::{ExecutionContext, ExecutionResult, StatementReport};

pub(super) fn execute(ctx: &ExecutionContext, matches: &[PathBuf]) -> ExecutionResult<StatementReport> {
    let report = StatementReport::new("SELECT", &ctx.root, matches);

    if report.paths.is_empty() {
        info!("[SELECT] No results found");
    } else {
        let listed = report
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        info!(matched = report.matched, "[SELECT] {}: {}", report.matched, listed);
    }

    Ok(report)
}
