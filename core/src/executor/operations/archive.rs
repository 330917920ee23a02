use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter, result::ZipError};

use super::{Action, has_extension, record, reject_same_location};
use crate::executor::{
    ExecutionContext, ExecutionError, ExecutionResult, StatementReport, ValidationError,
    ValidationResult,
};
use crate::ql::ast::TransferStmt;

pub(super) fn validate(stmt: &TransferStmt) -> ValidationResult<Action> {
    if !has_extension(&stmt.to) {
        return Err(ValidationError::DestinationNotFile {
            operation: "ARCHIVE",
            to: stmt.to.clone(),
        });
    }

    reject_same_location("ARCHIVE", stmt)?;

    Ok(Action::Archive {
        to: stmt.to.clone(),
    })
}

/// Writes every match into one zip file at `to`. Files are stored under
/// their basename, folders recursively under `<basename>/`.
pub(super) async fn execute(
    ctx: &ExecutionContext,
    to: &str,
    matches: &[PathBuf],
) -> ExecutionResult<StatementReport> {
    let mut report = StatementReport::new("ARCHIVE", &ctx.root, matches).with_destination(to);
    info!(matched = report.matched, "[ARCHIVE] {} to {}", report.matched, to);

    let archive = ctx.root.join(to);

    let mut entries = Vec::with_capacity(matches.len());
    for path in matches {
        if *path == archive {
            debug!(path = %path.display(), "Skipping the archive itself");
            report.skip(&ctx.root, path);
        } else {
            entries.push(path.clone());
        }
    }

    if entries.is_empty() {
        return Ok(report);
    }

    if let Some(parent) = archive.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExecutionError::io(parent, e))?;
    }

    let target = archive.clone();
    let paths = entries.clone();
    let results = tokio::task::spawn_blocking(move || write_archive(&target, &paths))
        .await
        .map_err(|e| ExecutionError::Task(e.to_string()))??;

    for (path, result) in entries.iter().zip(results) {
        record(&mut report, &ctx.root, path, result)?;
    }

    Ok(report)
}

fn write_archive(archive: &Path, entries: &[PathBuf]) -> ExecutionResult<Vec<ExecutionResult<()>>> {
    let file = File::create(archive).map_err(|e| ExecutionError::io(archive, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut results = Vec::with_capacity(entries.len());
    for path in entries {
        match add_entry(&mut writer, options, archive, path) {
            Err(e) if !e.is_not_found() => return Err(e),
            other => results.push(other),
        }
    }

    writer
        .finish()
        .map_err(|e| zip_error(archive, e))?;

    Ok(results)
}

fn add_entry(
    writer: &mut ZipWriter<File>,
    options: SimpleFileOptions,
    archive: &Path,
    path: &Path,
) -> ExecutionResult<()> {
    let base = path.parent().unwrap_or(path);

    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let at = e.path().unwrap_or(path).to_path_buf();
            ExecutionError::io(
                at,
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::other("file system loop")),
            )
        })?;

        if entry.path() == archive {
            continue;
        }

        let name = entry_name(entry.path().strip_prefix(base).unwrap_or(entry.path()));

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| zip_error(archive, e))?;
        } else {
            let mut source =
                File::open(entry.path()).map_err(|e| ExecutionError::io(entry.path(), e))?;
            writer
                .start_file(name, options)
                .map_err(|e| zip_error(archive, e))?;
            io::copy(&mut source, writer).map_err(|e| ExecutionError::io(entry.path(), e))?;
        }
    }

    Ok(())
}

// Zip entry names always use forward slashes.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub(super) fn zip_error(path: &Path, error: ZipError) -> ExecutionError {
    match error {
        ZipError::Io(e) => ExecutionError::io(path, e),
        other => ExecutionError::Archive {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
