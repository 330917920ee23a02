use std::sync::Arc;

use tracing::{error, info, warn};

use super::*;
use crate::convert::Converter;
use crate::ql::ast::{Query, Statement};

/// Runs the statements of a query one after another. A statement that is
/// rejected or fails is reported and the next one still runs.
pub struct Engine {
    converter: Arc<dyn Converter>,
}

impl Engine {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }

    pub async fn execute(&self, query: &Query) -> RunReport {
        let ctx = ExecutionContext::new(&query.directory, Arc::clone(&self.converter));
        let mut statements = Vec::with_capacity(query.statements.len());

        for statement in &query.statements {
            let outcome = self.execute_statement(&ctx, statement).await;
            statements.push(StatementResult {
                statement: statement.to_string(),
                outcome,
            });
        }

        RunReport {
            directory: query.directory.clone(),
            statements,
        }
    }

    pub async fn execute_statement(
        &self,
        ctx: &ExecutionContext,
        statement: &Statement,
    ) -> StatementOutcome {
        let validated = match operations::validate(statement) {
            Ok(validated) => validated,
            Err(e) => {
                error!(statement = %statement, error = %e, "Statement rejected");
                return StatementOutcome::Rejected(e);
            }
        };

        match operations::execute(ctx, &validated).await {
            Ok(report) => {
                if report.failures.is_empty() {
                    info!(
                        statement = %statement,
                        matched = report.matched,
                        processed = report.processed,
                        "Statement completed"
                    );
                } else {
                    warn!(
                        statement = %statement,
                        failures = report.failures.len(),
                        "Statement completed with failures"
                    );
                }
                StatementOutcome::Completed(report)
            }
            Err(e) => {
                error!(statement = %statement, error = %e, "Statement failed");
                StatementOutcome::Failed(e)
            }
        }
    }
}
