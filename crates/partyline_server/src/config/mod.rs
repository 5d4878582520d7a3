#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use serde::Deserialize;
use tracing::info;

/// Default relay listen port; hosting platforms override it via `PORT`.
pub const DEFAULT_WS_PORT: u16 = 10000;

/// Default liveness endpoint port.
pub const DEFAULT_HEALTH_PORT: u16 = 10010;

/// Default social graph snapshot file.
pub const DEFAULT_DATA_FILE: &str = "friend-data.json";

/// Default config path: `~/.partyline/config.toml`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
	let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
	Ok(home.join(".partyline").join("config.toml"))
}

/// Load the server config from TOML and env overrides.
pub fn load_server_config() -> anyhow::Result<ServerConfig> {
	let path = default_config_path()?;
	load_server_config_from_path(&path)
}

/// Same as `load_server_config` but with an explicit config path.
pub fn load_server_config_from_path(path: &Path) -> anyhow::Result<ServerConfig> {
	let file_cfg = read_toml_if_exists(path)
		.with_context(|| format!("read config from {}", path.display()))?
		.unwrap_or_default();

	let mut cfg = ServerConfig::from_file(file_cfg);

	apply_env_overrides(&mut cfg);

	Ok(cfg)
}

/// Resolved server config.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub server: ServerSettings,
}

/// Server settings loaded by the relay.
#[derive(Debug, Clone)]
pub struct ServerSettings {
	/// WebSocket listen address (host:port).
	pub ws_bind: String,
	/// Liveness HTTP bind address (host:port).
	pub health_bind: String,
	/// Optional metrics exporter bind address (host:port).
	pub metrics_bind: Option<String>,
	/// Social graph snapshot file.
	pub data_path: PathBuf,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			ws_bind: format!("0.0.0.0:{DEFAULT_WS_PORT}"),
			health_bind: format!("0.0.0.0:{DEFAULT_HEALTH_PORT}"),
			metrics_bind: None,
			data_path: PathBuf::from(DEFAULT_DATA_FILE),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	#[serde(default)]
	server: FileServerSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileServerSettings {
	ws_bind: Option<String>,
	health_bind: Option<String>,
	metrics_bind: Option<String>,
	data_path: Option<String>,
}

impl ServerConfig {
	fn from_file(file: FileConfig) -> Self {
		let defaults = ServerSettings::default();

		Self {
			server: ServerSettings {
				ws_bind: file
					.server
					.ws_bind
					.filter(|s| !s.trim().is_empty())
					.unwrap_or(defaults.ws_bind),
				health_bind: file
					.server
					.health_bind
					.filter(|s| !s.trim().is_empty())
					.unwrap_or(defaults.health_bind),
				metrics_bind: file.server.metrics_bind.filter(|s| !s.trim().is_empty()),
				data_path: file
					.server
					.data_path
					.filter(|s| !s.trim().is_empty())
					.map(PathBuf::from)
					.unwrap_or(defaults.data_path),
			},
		}
	}
}

fn read_toml_if_exists(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	match fs::read_to_string(path) {
		Ok(s) => {
			let cfg: FileConfig = toml::from_str(&s).context("parse TOML")?;
			Ok(Some(cfg))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(e) => Err(anyhow!(e).context("read config file")),
	}
}

fn apply_env_overrides(cfg: &mut ServerConfig) {
	// PORT is the hosting platform's convention; it replaces only the port
	// of the listen address.
	if let Ok(v) = std::env::var("PORT")
		&& let Ok(port) = v.trim().parse::<u16>()
	{
		let host = cfg
			.server
			.ws_bind
			.rsplit_once(':')
			.map(|(host, _)| host.to_string())
			.unwrap_or_else(|| "0.0.0.0".to_string());
		cfg.server.ws_bind = format!("{host}:{port}");
		info!(port, "server config: listen port overridden by PORT env");
	}

	if let Ok(v) = std::env::var("PARTYLINE_BIND") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.server.ws_bind = v;
			info!("server config: ws_bind overridden by env");
		}
	}

	if let Ok(v) = std::env::var("PARTYLINE_HEALTH_BIND") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.server.health_bind = v;
			info!("server config: health_bind overridden by env");
		}
	}

	if let Ok(v) = std::env::var("PARTYLINE_METRICS_BIND") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.server.metrics_bind = Some(v);
			info!("server config: metrics_bind overridden by env");
		}
	}

	if let Ok(v) = std::env::var("PARTYLINE_DATA_FILE") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.server.data_path = PathBuf::from(v);
			info!("server config: data_path overridden by env");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_file_yields_defaults() {
		let cfg = ServerConfig::from_file(FileConfig::default());
		assert_eq!(cfg.server.ws_bind, "0.0.0.0:10000");
		assert_eq!(cfg.server.health_bind, "0.0.0.0:10010");
		assert_eq!(cfg.server.metrics_bind, None);
		assert_eq!(cfg.server.data_path, PathBuf::from("friend-data.json"));
	}

	#[test]
	fn file_settings_override_defaults() {
		let file: FileConfig = toml::from_str(
			r#"
[server]
ws_bind = "127.0.0.1:9001"
metrics_bind = "127.0.0.1:9100"
data_path = "/var/lib/partyline/graph.json"
"#,
		)
		.expect("parse");

		let cfg = ServerConfig::from_file(file);
		assert_eq!(cfg.server.ws_bind, "127.0.0.1:9001");
		assert_eq!(cfg.server.health_bind, "0.0.0.0:10010");
		assert_eq!(cfg.server.metrics_bind.as_deref(), Some("127.0.0.1:9100"));
		assert_eq!(cfg.server.data_path, PathBuf::from("/var/lib/partyline/graph.json"));
	}

	#[test]
	fn blank_strings_fall_back_to_defaults() {
		let file: FileConfig = toml::from_str(
			r#"
[server]
ws_bind = "  "
metrics_bind = ""
"#,
		)
		.expect("parse");

		let cfg = ServerConfig::from_file(file);
		assert_eq!(cfg.server.ws_bind, "0.0.0.0:10000");
		assert_eq!(cfg.server.metrics_bind, None);
	}
}
