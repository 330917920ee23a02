//! Statement validation and the side effect behind each statement keyword.
//!
//! Validation is pure: it turns a parsed [`Statement`] into a
//! [`ValidatedStatement`] without touching the file system. Execution then
//! lists the matches through the [`Filter`] and performs the action.

mod archive;
mod convert;
mod copy;
mod delete;
mod relocate;
mod select;
mod unarchive;

use std::fmt;
use std::fs::FileType;
use std::path::{Component, Path};
use std::str::FromStr;

use tracing::warn;

use super::evaluator::Evaluator;
use super::filter::Filter;
use super::{
    ExecutionContext, ExecutionResult, StatementReport, ValidationError, ValidationResult,
};
use crate::convert::MediaFormat;
use crate::ql::ast::{Expression, Statement, TransferStmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Files,
    Folders,
}

impl Target {
    /// Symlinks are neither files nor folders.
    pub fn accepts(&self, file_type: &FileType) -> bool {
        match self {
            Target::Files => file_type.is_file(),
            Target::Folders => file_type.is_dir(),
        }
    }
}

impl FromStr for Target {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(Target::Files),
            "folders" => Ok(Target::Folders),
            other => Err(ValidationError::UnsupportedTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Files => f.write_str("files"),
            Target::Folders => f.write_str("folders"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select,
    Delete,
    Move { to: String },
    Copy { to: String },
    Archive { to: String },
    Unarchive { to: String },
    Convert { format: MediaFormat },
}

/// A statement that passed every check that needs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStatement {
    pub target: Target,
    pub from: String,
    pub where_clause: Option<Expression>,
    pub action: Action,
}

impl ValidatedStatement {
    pub fn operation(&self) -> &'static str {
        match self.action {
            Action::Select => "SELECT",
            Action::Delete => "DELETE",
            Action::Move { .. } => "MOVE",
            Action::Copy { .. } => "COPY",
            Action::Archive { .. } => "ARCHIVE",
            Action::Unarchive { .. } => "UNARCHIVE",
            Action::Convert { .. } => "CONVERT",
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match &self.action {
            Action::Move { to }
            | Action::Copy { to }
            | Action::Archive { to }
            | Action::Unarchive { to } => Some(to),
            Action::Select | Action::Delete | Action::Convert { .. } => None,
        }
    }
}

pub fn validate(statement: &Statement) -> ValidationResult<ValidatedStatement> {
    let selection = statement.selection();
    let target = selection.target.parse::<Target>()?;

    let action = match statement {
        Statement::Select(_) => Action::Select,
        Statement::Delete(_) => Action::Delete,
        Statement::Move(stmt) => relocate::validate(stmt)?,
        Statement::Copy(stmt) => copy::validate(stmt)?,
        Statement::Archive(stmt) => archive::validate(stmt)?,
        Statement::Unarchive(stmt) => unarchive::validate(target, stmt)?,
        Statement::Convert(stmt) => convert::validate(target, stmt)?,
    };

    let validated = ValidatedStatement {
        target,
        from: selection.from.clone(),
        where_clause: selection.where_clause.clone(),
        action,
    };

    confine(validated.operation(), &validated.from)?;
    if let Some(to) = validated.destination() {
        confine(validated.operation(), to)?;
    }

    if let Some(condition) = &validated.where_clause {
        Evaluator::check(condition).map_err(|e| ValidationError::InvalidPredicate(e.to_string()))?;
    }

    Ok(validated)
}

pub async fn execute(
    ctx: &ExecutionContext,
    statement: &ValidatedStatement,
) -> ExecutionResult<StatementReport> {
    let matches = Filter::new(&ctx.root).apply(statement).await?;

    match &statement.action {
        Action::Select => select::execute(ctx, &matches),
        Action::Delete => delete::execute(ctx, statement.target, &matches).await,
        Action::Move { to } => relocate::execute(ctx, to, &matches).await,
        Action::Copy { to } => copy::execute(ctx, to, &matches).await,
        Action::Archive { to } => archive::execute(ctx, to, &matches).await,
        Action::Unarchive { to } => unarchive::execute(ctx, to, &matches).await,
        Action::Convert { format } => convert::execute(ctx, format, &matches).await,
    }
}

// FROM and TO are joined onto the query directory and must not leave it.
fn confine(operation: &'static str, path: &str) -> ValidationResult<()> {
    let escapes = Path::new(path).components().any(|c| {
        matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir)
    });

    if escapes {
        return Err(ValidationError::OutsideDirectory {
            operation,
            path: path.to_string(),
        });
    }

    Ok(())
}

fn reject_same_location(operation: &'static str, stmt: &TransferStmt) -> ValidationResult<()> {
    if Path::new(&stmt.to) == Path::new(&stmt.selection.from) {
        return Err(ValidationError::SameLocation {
            operation,
            location: stmt.to.clone(),
        });
    }

    Ok(())
}

fn has_extension(to: &str) -> bool {
    Path::new(to).extension().is_some()
}

/// Counts a finished per-path action. A path that disappeared after
/// listing is recorded as a failure and the statement carries on.
fn record(
    report: &mut StatementReport,
    root: &Path,
    path: &Path,
    result: ExecutionResult<()>,
) -> ExecutionResult<()> {
    match result {
        Ok(()) => {
            report.processed += 1;
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!(operation = report.operation, path = %path.display(), "Path vanished before it could be processed");
            report.fail(root, path, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
