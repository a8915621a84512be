//! Storage configuration and connection pool settings

use crate::database::backend::{BackendConfig, BackendKind, EmbeddedBackend, NetworkedBackend};
use crate::database::error::{DatabaseError, DatabaseResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the embedded database lives unless configured otherwise
pub const DEFAULT_DATABASE_PATH: &str = "plugins/NextGens/generators.db";

/// Storage section of the plugin configuration
///
/// Mirrors the `mysql.*` keys of `config.yml`. With `mysql.enabled = false`
/// the embedded file backend at `database_path` is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
	pub mysql: MySqlConfig,

	/// Location of the embedded database file
	pub database_path: PathBuf,
}

/// Connection details for the networked backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MySqlConfig {
	pub enabled: bool,
	pub host: String,
	pub port: u16,
	pub database: String,
	pub user: String,
	pub password: String,
	#[serde(rename = "useSSL")]
	pub use_ssl: bool,
}

impl Default for MySqlConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			host: "localhost".to_string(),
			port: 3306,
			database: "nextgens".to_string(),
			user: "root".to_string(),
			password: String::new(),
			use_ssl: false,
		}
	}
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self { mysql: MySqlConfig::default(), database_path: PathBuf::from(DEFAULT_DATABASE_PATH) }
	}
}

impl StorageConfig {
	/// Embedded backend at a custom path
	pub fn embedded(path: impl Into<PathBuf>) -> Self {
		Self { database_path: path.into(), ..Default::default() }
	}

	/// Networked backend with the given connection details
	pub fn networked(mysql: MySqlConfig) -> Self {
		Self { mysql: MySqlConfig { enabled: true, ..mysql }, ..Default::default() }
	}

	pub fn from_json_str(raw: &str) -> DatabaseResult<Self> {
		let config: Self = serde_json::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_json_file(path: &Path) -> DatabaseResult<Self> {
		let raw = std::fs::read_to_string(path)?;
		Self::from_json_str(&raw)
	}

	/// Which backend this configuration selects
	pub fn backend_kind(&self) -> BackendKind {
		if self.mysql.enabled {
			BackendKind::Networked
		} else {
			BackendKind::Embedded
		}
	}

	/// Resolve the configuration into exactly one backend
	pub fn backend(&self) -> BackendConfig {
		match self.backend_kind() {
			BackendKind::Networked => BackendConfig::Networked(NetworkedBackend::new(
				self.mysql.host.clone(),
				self.mysql.port,
				self.mysql.database.clone(),
				self.mysql.user.clone(),
				self.mysql.password.clone(),
				self.mysql.use_ssl,
			)),
			BackendKind::Embedded => {
				BackendConfig::Embedded(EmbeddedBackend::new(self.database_path.clone()))
			}
		}
	}

	/// Validate configuration parameters
	pub fn validate(&self) -> DatabaseResult<()> {
		let invalid = |reason: &str| Err(DatabaseError::InvalidConfiguration(reason.to_string()));

		if self.mysql.enabled {
			if self.mysql.host.trim().is_empty() {
				return invalid("mysql.host must not be empty");
			}
			if self.mysql.port == 0 {
				return invalid("mysql.port must be greater than 0");
			}
			if self.mysql.database.trim().is_empty() {
				return invalid("mysql.database must not be empty");
			}
		} else if self.database_path.as_os_str().is_empty() {
			return invalid("databasePath must not be empty");
		}

		Ok(())
	}
}

/// Settings shared by every connection pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
	pub pool_name: String,

	/// Query run against a fresh pool to prove the backend answers
	pub connection_test_query: String,

	/// How long `get_connection` blocks before giving up
	pub connection_timeout: Duration,

	/// Idle connections above `min_idle` are closed after this long
	pub idle_timeout: Duration,

	/// Connections held longer than this are reported as possible leaks
	pub leak_detection_threshold: Option<Duration>,

	/// Character set requested from the networked backend
	pub character_encoding: String,

	pub max_size: u32,

	/// `None` keeps `max_size` connections open
	pub min_idle: Option<u32>,
}

impl Default for PoolSettings {
	fn default() -> Self {
		Self {
			pool_name: "NextGens Database Pool".to_string(),
			connection_test_query: "SELECT 1".to_string(),
			connection_timeout: Duration::from_secs(60),
			idle_timeout: Duration::from_secs(600),
			leak_detection_threshold: Some(Duration::from_secs(180)),
			character_encoding: "utf8mb4".to_string(),
			max_size: 10,
			min_idle: None,
		}
	}
}

impl PoolSettings {
	/// The embedded engine has a single writer, so the pool holds one connection
	pub fn for_embedded() -> Self {
		Self { max_size: 1, min_idle: None, ..Default::default() }
	}

	pub fn for_networked() -> Self {
		Self { max_size: 50, min_idle: Some(5), ..Default::default() }
	}

	pub fn for_backend(kind: BackendKind) -> Self {
		match kind {
			BackendKind::Embedded => Self::for_embedded(),
			BackendKind::Networked => Self::for_networked(),
		}
	}

	/// Validate configuration parameters
	pub fn validate(&self) -> DatabaseResult<()> {
		if self.max_size == 0 {
			return Err(DatabaseError::InvalidConfiguration(
				"Pool max size must be greater than 0".to_string(),
			));
		}

		if self.min_idle.is_some_and(|min| min > self.max_size) {
			return Err(DatabaseError::InvalidConfiguration(
				"Pool min idle cannot be larger than max size".to_string(),
			));
		}

		if self.connection_timeout.is_zero() {
			return Err(DatabaseError::InvalidConfiguration(
				"Connection timeout must be greater than 0".to_string(),
			));
		}

		Ok(())
	}
}
