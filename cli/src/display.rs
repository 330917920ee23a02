use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use sortql_core::{RunReport, StatementOutcome, StatementReport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn print_header(directory: Option<&Path>, queries: Option<&Path>, watch: bool) {
	println!("{}", "═".repeat(40).bright_blue());
	println!("{}", "SortQL CLI".bright_blue().bold());
	println!("{}", format!("v{}", VERSION).bright_blue());
	println!("{}", "═".repeat(40).bright_blue());
	println!();

	let (Some(directory), Some(queries)) = (directory, queries) else {
		return;
	};

	println!("{}", "sortql running with:".bright_black());
	println!("{}", format!("- directory: {}", directory.display()).bright_black());
	println!("{}", format!("- queries: {}", queries.display()).bright_black());
	println!(
		"{}",
		format!("- watch: {}", if watch { "enabled" } else { "disabled" }).bright_black()
	);
	println!();
}

pub fn print_step(msg: &str) {
	println!("{} {}", "→".bright_blue(), msg.bright_blue());
}

pub fn print_error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_red());
}

pub fn print_warning(msg: &str) {
	println!("{} {}", "⚠".bright_yellow(), msg.bright_yellow());
}

pub fn print_success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_green());
}

pub fn print_query_error(error_msg: &str, query: &str) {
	print_error(error_msg);

	let lines: Vec<&str> = query.lines().collect();
	if !query.trim().is_empty() && lines.len() <= 10 {
		eprintln!();
		eprintln!("{}", "Queries:".bright_yellow());
		for (i, line) in lines.iter().enumerate() {
			eprintln!("{:3} │ {}", i + 1, line.dimmed());
		}
	}
}

pub fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(report)?);
		return Ok(());
	}

	println!("{}", render_table(report));

	for result in &report.statements {
		if let StatementOutcome::Completed(statement) = &result.outcome {
			print_details(statement);
		}
	}

	if report.has_failures() {
		print_warning("Some statements did not complete cleanly");
	} else {
		print_success("Queries executed");
	}

	Ok(())
}

pub fn render_table(report: &RunReport) -> Table {
	let mut table = Table::new();
	table
		.load_preset(UTF8_FULL)
		.set_content_arrangement(ContentArrangement::Dynamic)
		.set_header(vec![
			"Statement",
			"Status",
			"Matched",
			"Processed",
			"Skipped",
			"Failed",
		]);

	for result in &report.statements {
		let row = match &result.outcome {
			StatementOutcome::Completed(statement) => {
				let (status, color) = if statement.failures.is_empty() {
					("done", Color::Green)
				} else {
					("partial", Color::Yellow)
				};

				vec![
					Cell::new(&result.statement),
					Cell::new(status).fg(color),
					Cell::new(statement.matched),
					Cell::new(statement.processed),
					Cell::new(statement.skipped.len()),
					Cell::new(statement.failures.len()),
				]
			}
			StatementOutcome::Rejected(e) => failed_row(&result.statement, "rejected", e),
			StatementOutcome::Failed(e) => failed_row(&result.statement, "failed", e),
		};
		table.add_row(row);
	}

	table
}

fn failed_row(statement: &str, status: &str, error: &dyn std::fmt::Display) -> Vec<Cell> {
	vec![
		Cell::new(statement),
		Cell::new(format!("{}: {}", status, error)).fg(Color::Red),
		Cell::new("-"),
		Cell::new("-"),
		Cell::new("-"),
		Cell::new("-"),
	]
}

fn print_details(statement: &StatementReport) {
	if statement.operation == "SELECT" {
		let label = format!("↳ [SELECT] {} match(es)", statement.matched);
		println!("{}", label.bright_yellow());
		for path in &statement.paths {
			println!("    {}", path.display());
		}
	}

	for failure in &statement.failures {
		println!(
			"  {} [{}] {}: {}",
			"✗".bright_red(),
			statement.operation,
			failure.path.display(),
			failure.reason.bright_red()
		);
	}
}
