use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

const FILE_NAME: &str = ".sortql";

/// Persisted `.sortql` settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub directory: Option<PathBuf>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub queries: Option<PathBuf>,
	#[serde(default)]
	pub watch: bool,
}

impl Config {
	/// Loads the file at `path` with `SORTQL_*` overrides applied. A missing
	/// file yields the defaults.
	pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
		ConfigLoader::new(path).load()
	}

	pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn is_complete(&self) -> bool {
		self.directory.is_some() && self.queries.is_some()
	}
}

/// `--config`, then `SORTQL_CONFIG`, then `~/.sortql`.
pub fn resolve_path(flag: Option<PathBuf>) -> PathBuf {
	if let Some(path) = flag {
		return path;
	}

	if let Some(path) = env::var_os("SORTQL_CONFIG") {
		return PathBuf::from(path);
	}

	dirs::home_dir()
		.map(|home| home.join(FILE_NAME))
		.unwrap_or_else(|| PathBuf::from(FILE_NAME))
}

struct ConfigLoader {
	path: PathBuf,
}

impl ConfigLoader {
	fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	fn load(&self) -> anyhow::Result<Config> {
		let mut cfg = self.read()?;
		Self::apply_overrides(&mut cfg, |key| env::var(key).ok());
		Ok(cfg)
	}

	fn read(&self) -> anyhow::Result<Config> {
		match fs::read_to_string(&self.path) {
			Ok(s) => serde_json::from_str(&s)
				.map_err(|e| anyhow::anyhow!("Invalid config {}: {}", self.path.display(), e)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
			Err(e) => Err(e.into()),
		}
	}

	/// Apply SORTQL_* overrides from `lookup`.
	fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(v) = lookup("SORTQL_DIRECTORY") {
			cfg.directory = Some(PathBuf::from(v));
		}

		if let Some(v) = lookup("SORTQL_QUERIES") {
			cfg.queries = Some(PathBuf::from(v));
		}

		if let Some(v) = lookup("SORTQL_WATCH")
			&& let Some(watch) = parse_flag(&v)
		{
			cfg.watch = watch;
		}
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_missing_file_gives_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let cfg = ConfigLoader::new(dir.path().join("absent")).read().unwrap();
		assert_eq!(cfg, Config::default());
	}

	#[test]
	fn test_round_trip_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join(".sortql");

		let cfg = Config {
			directory: Some(PathBuf::from("/data/inbox")),
			queries: Some(PathBuf::from("/data/queries.sql")),
			watch: true,
		};
		cfg.save(&path).unwrap();

		let text = fs::read_to_string(&path).unwrap();
		assert!(text.contains("\"watch\": true"));

		let loaded: Config = serde_json::from_str(&text).unwrap();
		assert_eq!(loaded, cfg);
		assert!(loaded.is_complete());
	}

	#[test]
	fn test_partial_file() {
		let cfg: Config = serde_json::from_str(r#"{ "directory": "/tmp" }"#).unwrap();
		assert_eq!(cfg.directory, Some(PathBuf::from("/tmp")));
		assert!(!cfg.watch);
		assert!(!cfg.is_complete());
	}

	#[test]
	fn test_invalid_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".sortql");
		fs::write(&path, "directory = 1").unwrap();
		assert!(ConfigLoader::new(&path).read().is_err());
	}

	#[test]
	fn test_overrides() {
		let vars: HashMap<&str, &str> = [
			("SORTQL_DIRECTORY", "/srv/files"),
			("SORTQL_WATCH", "yes"),
		]
		.into_iter()
		.collect();

		let mut cfg = Config {
			directory: Some(PathBuf::from("/old")),
			queries: Some(PathBuf::from("/q.sql")),
			watch: false,
		};
		ConfigLoader::apply_overrides(&mut cfg, |key| vars.get(key).map(|v| v.to_string()));

		assert_eq!(cfg.directory, Some(PathBuf::from("/srv/files")));
		assert_eq!(cfg.queries, Some(PathBuf::from("/q.sql")));
		assert!(cfg.watch);
	}

	#[test]
	fn test_unparsable_watch_flag_is_ignored() {
		let mut cfg = Config {
			watch: true,
			..Default::default()
		};
		ConfigLoader::apply_overrides(&mut cfg, |key| {
			(key == "SORTQL_WATCH").then(|| "maybe".to_string())
		});
		assert!(cfg.watch);
	}

	#[test]
	fn test_flag_wins_path_resolution() {
		let path = resolve_path(Some(PathBuf::from("/etc/sortql.json")));
		assert_eq!(path, PathBuf::from("/etc/sortql.json"));
	}
}
