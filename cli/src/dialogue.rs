use std::path::{Path, PathBuf};

use anyhow::bail;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::config::Config;
use crate::display;

/// Asks for the settings that are still unknown, or for all of them when
/// `everything` is set.
pub fn configure(current: &Config, everything: bool) -> anyhow::Result<Config> {
	display::print_step("Entering configuration mode...");
	println!();

	let mut editor = DefaultEditor::new()?;
	let mut config = current.clone();

	if everything || config.directory.is_none() {
		config.directory = Some(ask(
			&mut editor,
			"Where do you want to run the queries?",
			current.directory.as_deref(),
			validate_directory,
		)?);
	}

	if everything || config.queries.is_none() {
		config.queries = Some(ask(
			&mut editor,
			"Where is your queries.sql file located?",
			current.queries.as_deref(),
			validate_queries,
		)?);
	}

	if everything {
		config.watch = confirm(
			&mut editor,
			"Do you want to watch the directory for changes and rerun queries?",
			current.watch,
		)?;
	}

	Ok(config)
}

fn ask(
	editor: &mut DefaultEditor,
	message: &str,
	initial: Option<&Path>,
	validate: fn(&Path) -> Result<(), String>,
) -> anyhow::Result<PathBuf> {
	let prompt = format!("{} {} ", "?".bright_green().bold(), message.bold());
	let initial = initial
		.map(|p| p.display().to_string())
		.unwrap_or_default();

	loop {
		let line = read(editor, &prompt, &initial)?;
		let path = PathBuf::from(clean_input(&line));

		match validate(&path) {
			Ok(()) => return Ok(std::path::absolute(&path)?),
			Err(msg) => display::print_error(&msg),
		}
	}
}

fn confirm(editor: &mut DefaultEditor, message: &str, default: bool) -> anyhow::Result<bool> {
	let hint = if default { "(Y/n)" } else { "(y/N)" };
	let prompt = format!("{} {} {} ", "?".bright_green().bold(), message.bold(), hint.dimmed());

	loop {
		let line = read(editor, &prompt, "")?;
		match line.trim().to_ascii_lowercase().as_str() {
			"" => return Ok(default),
			"y" | "yes" => return Ok(true),
			"n" | "no" => return Ok(false),
			_ => display::print_error("Please answer yes or no"),
		}
	}
}

fn read(editor: &mut DefaultEditor, prompt: &str, initial: &str) -> anyhow::Result<String> {
	match editor.readline_with_initial(prompt, (initial, "")) {
		Ok(line) => Ok(line),
		Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
			bail!("Configuration cancelled")
		}
		Err(e) => Err(e.into()),
	}
}

/// Trims the input and drops every quote character, so paths pasted from
/// a file manager work as typed.
pub fn clean_input(input: &str) -> String {
	input.trim().replace(['\'', '"'], "")
}

pub fn validate_directory(path: &Path) -> Result<(), String> {
	if path.as_os_str().is_empty() {
		return Err("Please enter a directory".to_string());
	}

	match std::fs::metadata(path) {
		Ok(metadata) if metadata.is_dir() => Ok(()),
		_ => Err("Please enter a valid directory".to_string()),
	}
}

pub fn validate_queries(path: &Path) -> Result<(), String> {
	if path.as_os_str().is_empty() {
		return Err("Please enter a file path".to_string());
	}

	match std::fs::metadata(path) {
		Ok(metadata) if metadata.is_file() => Ok(()),
		_ => Err("Please enter a valid file path".to_string()),
	}
}
