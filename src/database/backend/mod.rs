//! Backend abstraction
//!
//! Each backend turns its configuration into a [`ConnectionSource`] through
//! [`PoolBackend::open_pool`]. Everything above this module talks to
//! connections through [`SqlConnection`] and [`SqlStatement`] only, so the
//! same statements run against the embedded file and the networked server.

mod embedded;
mod networked;

pub use embedded::EmbeddedBackend;
pub use networked::NetworkedBackend;

use crate::database::config::PoolSettings;
use crate::database::error::DatabaseResult;
use crate::database::types::{ResultSet, SqlValue};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
	/// Single-file SQLite database
	Embedded,
	/// MySQL server reached over the network
	Networked,
}

impl BackendKind {
	pub fn label(&self) -> &'static str {
		match self {
			BackendKind::Embedded => "SQLite",
			BackendKind::Networked => "MySQL",
		}
	}
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Snapshot of a pool's connection counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
	pub connections: u32,
	pub idle: u32,
}

/// A prepared statement
///
/// Parameters are positional and 1-based. Dropping the statement releases it.
pub trait SqlStatement {
	fn bind(&mut self, index: usize, value: SqlValue) -> DatabaseResult<()>;

	/// Run a statement that produces no rows, returning the affected row count
	fn execute(&mut self) -> DatabaseResult<u64>;

	/// Run a statement and read every row it produces
	fn query(&mut self) -> DatabaseResult<ResultSet>;
}

/// A live connection checked out of a pool
pub trait SqlConnection: Send {
	fn prepare(&mut self, sql: &str) -> DatabaseResult<Box<dyn SqlStatement + '_>>;
}

/// A pool of connections to one backend
pub trait ConnectionSource: Send + Sync {
	fn kind(&self) -> BackendKind;

	/// Check out a connection, blocking up to the pool's connection timeout
	fn acquire(&self) -> DatabaseResult<Box<dyn SqlConnection>>;

	fn status(&self) -> PoolStatus;
}

/// Opens a connection pool for one kind of backend
pub trait PoolBackend {
	fn kind(&self) -> BackendKind;

	fn open_pool(&self, settings: &PoolSettings) -> DatabaseResult<Box<dyn ConnectionSource>>;
}

/// The backends a [`StorageConfig`](crate::database::StorageConfig) can select
#[derive(Debug, Clone)]
pub enum BackendConfig {
	Embedded(EmbeddedBackend),
	Networked(NetworkedBackend),
}

impl PoolBackend for BackendConfig {
	fn kind(&self) -> BackendKind {
		match self {
			BackendConfig::Embedded(backend) => backend.kind(),
			BackendConfig::Networked(backend) => backend.kind(),
		}
	}

	fn open_pool(&self, settings: &PoolSettings) -> DatabaseResult<Box<dyn ConnectionSource>> {
		match self {
			BackendConfig::Embedded(backend) => backend.open_pool(settings),
			BackendConfig::Networked(backend) => backend.open_pool(settings),
		}
	}
}

/// Start an r2d2 builder from the shared pool settings
pub(crate) fn pool_builder<M: r2d2::ManageConnection>(settings: &PoolSettings) -> r2d2::Builder<M> {
	r2d2::Pool::builder()
		.max_size(settings.max_size)
		.min_idle(settings.min_idle)
		.connection_timeout(settings.connection_timeout)
		.idle_timeout(Some(settings.idle_timeout))
		.test_on_check_out(true)
}
