//! Generator store
//!
//! [`GeneratorStore`] is the persistence component handed to the generator
//! registry. It owns the connection pool; the statement primitives live in
//! `executor`, schema setup in `schema` and record operations in
//! `generators`.

use crate::database::backend::{BackendKind, PoolBackend, PoolStatus};
use crate::database::config::{PoolSettings, StorageConfig};
use crate::database::error::DatabaseResult;
use crate::database::pool::{ConnectionPool, PooledConnection};

pub struct GeneratorStore {
	pool: ConnectionPool,
}

impl GeneratorStore {
	/// Connect to the backend selected by `config`
	///
	/// Errors from here are fatal for the owning plugin: there is no
	/// degraded mode without persistence.
	pub fn connect(config: &StorageConfig) -> DatabaseResult<Self> {
		config.validate()?;
		let backend = config.backend();
		let settings = PoolSettings::for_backend(backend.kind());
		Self::connect_with(&backend, settings)
	}

	/// Connect to an explicit backend with custom pool settings
	pub fn connect_with(backend: &dyn PoolBackend, settings: PoolSettings) -> DatabaseResult<Self> {
		Ok(Self::with_pool(ConnectionPool::open(backend, settings)?))
	}

	pub fn with_pool(pool: ConnectionPool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &ConnectionPool {
		&self.pool
	}

	pub fn backend_kind(&self) -> BackendKind {
		self.pool.kind()
	}

	pub fn pool_status(&self) -> PoolStatus {
		self.pool.status()
	}

	/// Check out a raw connection from the pool
	pub fn get_connection(&self) -> DatabaseResult<PooledConnection> {
		self.pool.get_connection()
	}

	/// Release the pool; call once at shutdown
	pub fn close(self) {
		self.pool.close();
	}
}
