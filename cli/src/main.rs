mod codec;
mod config;
mod dialogue;
mod display;
mod watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sortql_core::ql::parser::Lexer;
use sortql_core::{Client, SortError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::codec::MediaConverter;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "sortql", version, about = "Sort files with SQL-like queries")]
struct Args {
	/// Directory the queries run against
	#[arg(short, long)]
	directory: Option<PathBuf>,

	/// File holding the queries
	#[arg(short, long)]
	queries: Option<PathBuf>,

	/// Re-run the queries whenever the directory changes
	#[arg(short, long)]
	watch: bool,

	/// Run once even if the config enables watching
	#[arg(long, conflicts_with = "watch")]
	once: bool,

	/// Config file (default: ~/.sortql)
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Ask for every setting again and rewrite the config file
	#[arg(long)]
	reconfigure: bool,

	/// Print the run report as JSON
	#[arg(long)]
	json: bool,

	/// Print the parsed queries as JSON and exit
	#[arg(long)]
	ast: bool,

	/// Print the token stream and exit
	#[arg(long)]
	tokens: bool,

	/// Enable debug logging
	#[arg(short, long)]
	verbose: bool,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
	pub json: bool,
}

fn get_env_filter(verbose: bool) -> EnvFilter {
	if verbose {
		EnvFilter::new("sortql=debug,sortql_core=debug")
	} else if std::env::var_os("RUST_LOG").is_some() {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
	} else if cfg!(debug_assertions) {
		EnvFilter::new("sortql=debug,sortql_core=debug")
	} else {
		EnvFilter::new("sortql=info,sortql_core=info")
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_ansi(true)
		.with_target(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.compact();

	Registry::default()
		.with(get_env_filter(args.verbose))
		.with(stderr_layer)
		.init();

	display::print_header(None, None, false);

	let config_path = config::resolve_path(args.config.clone());
	let settings = settings(&args, &config_path)?;

	let (Some(directory), Some(queries)) = (settings.directory.clone(), settings.queries.clone())
	else {
		anyhow::bail!("Both a directory and a queries file are required");
	};
	let watching = settings.watch && !args.once;

	if args.tokens || args.ast {
		return inspect(&args, &directory, &queries);
	}

	let client = Arc::new(Client::with_converter(
		&directory,
		Arc::new(MediaConverter::from_env()),
	));
	let options = RunOptions { json: args.json };

	if !watching {
		display::print_header(Some(&directory), Some(&queries), false);
		let clean = run_queries(&client, &queries, &options).await?;
		return Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE });
	}

	let shutdown = CancellationToken::new();
	spawn_signal_handler(shutdown.clone());

	watch::watch(client, queries, options, shutdown).await?;
	Ok(ExitCode::SUCCESS)
}

/// Flags over env over file. Prompts for anything still missing and saves
/// the answers.
fn settings(args: &Args, config_path: &Path) -> anyhow::Result<Config> {
	display::print_step("Checking for .sortql config file...");
	let mut cfg = Config::load(config_path)?;

	if let Some(directory) = &args.directory {
		cfg.directory = Some(std::path::absolute(directory)?);
	}
	if let Some(queries) = &args.queries {
		cfg.queries = Some(std::path::absolute(queries)?);
	}
	if args.watch {
		cfg.watch = true;
	}

	if args.reconfigure || !cfg.is_complete() {
		if !args.reconfigure {
			display::print_warning("No complete .sortql config found");
		}
		cfg = dialogue::configure(&cfg, args.reconfigure)?;
		cfg.save(config_path)?;
		display::print_success(&format!("Saved .sortql config to {}", config_path.display()));
	} else {
		display::print_success(&format!("Using .sortql config from {}", config_path.display()));
	}

	Ok(cfg)
}

fn inspect(args: &Args, directory: &Path, queries: &Path) -> anyhow::Result<ExitCode> {
	let content = std::fs::read_to_string(queries)?;

	if args.tokens {
		match Lexer::tokenize(&content) {
			Ok(tokens) => println!("{}", serde_json::to_string_pretty(&tokens)?),
			Err(e) => {
				display::print_query_error(&e.to_string(), &content);
				return Ok(ExitCode::FAILURE);
			}
		}
	}

	if args.ast {
		match sortql_core::ql::parse(&content, directory) {
			Ok(query) => println!("{}", serde_json::to_string_pretty(&query)?),
			Err(e) => {
				display::print_query_error(&e.to_string(), &content);
				return Ok(ExitCode::FAILURE);
			}
		}
	}

	Ok(ExitCode::SUCCESS)
}

/// Reads the queries file, runs it and prints the report. Returns whether
/// every statement completed without failures.
pub(crate) async fn run_queries(
	client: &Client,
	queries: &Path,
	options: &RunOptions,
) -> anyhow::Result<bool> {
	display::print_step("Parsing queries...");

	let content = tokio::fs::read_to_string(queries).await?;

	match client.run(&content).await {
		Ok(report) => {
			display::print_report(&report, options.json)?;
			Ok(!report.has_failures())
		}
		Err(SortError::Parse(e)) => {
			display::print_query_error(&e.to_string(), &content);
			Ok(false)
		}
		Err(e) => Err(e.into()),
	}
}

fn spawn_signal_handler(shutdown: CancellationToken) {
	tokio::spawn(async move {
		#[cfg(unix)]
		{
			use tokio::signal;

			let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
				.expect("Failed to register SIGINT handler");
			let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
				.expect("Failed to register SIGTERM handler");

			tokio::select! {
				_ = sigint.recv() => {
					tracing::info!("Received SIGINT (Ctrl+C), shutting down...");
				}
				_ = sigterm.recv() => {
					tracing::info!("Received SIGTERM, shutting down...");
				}
			}
		}

		#[cfg(not(unix))]
		{
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!("Failed to listen for Ctrl+C: {e}");
				return;
			}
			tracing::info!("Received Ctrl+C, shutting down...");
		}

		shutdown.cancel();
	});
}
