//! Re-runs the queries whenever the target directory changes.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sortql_core::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{RunOptions, display, run_queries};

/// Lets one run in at a time. Triggers that arrive while a run holds the
/// guard are dropped, not queued.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
	running: Arc<AtomicBool>,
}

impl RunGuard {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn try_acquire(&self) -> Option<RunTicket> {
		self.running
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| RunTicket {
				running: Arc::clone(&self.running),
			})
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}
}

/// Releases the guard when dropped.
#[derive(Debug)]
pub struct RunTicket {
	running: Arc<AtomicBool>,
}

impl Drop for RunTicket {
	fn drop(&mut self) {
		self.running.store(false, Ordering::Release);
	}
}

pub async fn watch(
	client: Arc<Client>,
	queries: PathBuf,
	options: RunOptions,
	shutdown: CancellationToken,
) -> anyhow::Result<()> {
	let directory = client.directory().to_path_buf();
	let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

	let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
		let _ = tx.send(res);
	})?;
	watcher.watch(&directory, RecursiveMode::Recursive)?;

	info!(path = %directory.display(), "Watching directory for changes");

	let guard = RunGuard::new();
	trigger(&guard, &client, &queries, &options);

	loop {
		tokio::select! {
			_ = shutdown.cancelled() => {
				info!("Stopping watcher");
				break;
			}
			received = rx.recv() => {
				let Some(result) = received else {
					break;
				};

				match result {
					Ok(event) if is_relevant(&event, &directory) => {
						debug!(kind = ?event.kind, paths = ?event.paths, "Directory changed");
						trigger(&guard, &client, &queries, &options);
					}
					Ok(_) => {}
					Err(e) => error!(error = %e, "Filesystem watcher error"),
				}
			}
		}
	}

	Ok(())
}

fn trigger(guard: &RunGuard, client: &Arc<Client>, queries: &Path, options: &RunOptions) {
	let Some(ticket) = guard.try_acquire() else {
		debug!("Run in progress, dropping trigger");
		return;
	};

	let client = Arc::clone(client);
	let queries = queries.to_path_buf();
	let options = options.clone();

	tokio::spawn(async move {
		let _ticket = ticket;

		display::print_header(Some(client.directory()), Some(&queries), true);
		if let Err(e) = run_queries(&client, &queries, &options).await {
			display::print_error(&format!("Error running queries: {:#}", e));
		}
	});
}

/// Access notifications and changes to dot-files never trigger a run.
fn is_relevant(event: &Event, root: &Path) -> bool {
	if matches!(event.kind, EventKind::Access(_)) {
		return false;
	}

	event.paths.iter().any(|path| !is_hidden(path, root))
}

fn is_hidden(path: &Path, root: &Path) -> bool {
	path.strip_prefix(root)
		.unwrap_or(path)
		.components()
		.any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

#[cfg(test)]
mod tests {
	use super::*;
	use notify::event::{AccessKind, CreateKind, ModifyKind};

	#[test]
	fn test_guard_drops_overlapping_runs() {
		let guard = RunGuard::new();

		let ticket = guard.try_acquire().expect("first run acquires");
		assert!(guard.is_running());
		assert!(guard.try_acquire().is_none());

		drop(ticket);
		assert!(!guard.is_running());
		assert!(guard.try_acquire().is_some());
	}

	#[test]
	fn test_guard_is_shared_between_clones() {
		let guard = RunGuard::new();
		let other = guard.clone();

		let _ticket = guard.try_acquire().unwrap();
		assert!(other.try_acquire().is_none());
	}

	#[test]
	fn test_hidden_paths() {
		let root = Path::new("/data");
		assert!(is_hidden(Path::new("/data/.git/index"), root));
		assert!(is_hidden(Path::new("/data/.DS_Store"), root));
		assert!(!is_hidden(Path::new("/data/photos/a.png"), root));
		// Only components below the root count.
		assert!(!is_hidden(Path::new("/home/.me/data/a.png"), Path::new("/home/.me/data")));
	}

	#[test]
	fn test_relevant_events() {
		let root = Path::new("/data");

		let create = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/data/a.txt"));
		assert!(is_relevant(&create, root));

		let hidden = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/data/.cache"));
		assert!(!is_relevant(&hidden, root));

		let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("/data/a.txt"));
		assert!(!is_relevant(&access, root));
	}
}
