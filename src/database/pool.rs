//! Connection pool lifecycle
//!
//! [`ConnectionPool`] owns the pool of whichever backend was configured.
//! It is opened once at startup and consumed by [`ConnectionPool::close`]
//! at shutdown.

use crate::database::backend::{
	BackendKind, ConnectionSource, PoolBackend, PoolStatus, SqlConnection, SqlStatement,
};
use crate::database::config::PoolSettings;
use crate::database::error::DatabaseResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct ConnectionPool {
	source: Box<dyn ConnectionSource>,
	settings: PoolSettings,
	name: Arc<str>,
}

impl ConnectionPool {
	/// Open the pool for `backend` and prove it answers the test query
	///
	/// Failures are returned as-is; they are not retried.
	pub fn open(backend: &dyn PoolBackend, settings: PoolSettings) -> DatabaseResult<Self> {
		settings.validate()?;
		let kind = backend.kind();

		info!("Trying to connect to the {} database...", kind);
		let pool = backend
			.open_pool(&settings)
			.map(|source| Self::from_source(source, settings))
			.and_then(|pool| pool.probe().map(|_| pool))
			.map_err(|e| {
				error!("Failed to connect to the {} database: {}", kind, e);
				e
			})?;
		info!("Successfully established connection with {} database!", kind);

		Ok(pool)
	}

	/// Wrap an already opened connection source
	pub fn from_source(source: Box<dyn ConnectionSource>, settings: PoolSettings) -> Self {
		let name = Arc::from(settings.pool_name.as_str());
		Self { source, settings, name }
	}

	pub fn kind(&self) -> BackendKind {
		self.source.kind()
	}

	pub fn settings(&self) -> &PoolSettings {
		&self.settings
	}

	pub fn status(&self) -> PoolStatus {
		self.source.status()
	}

	/// Check out one connection, blocking up to the configured timeout
	///
	/// The connection goes back to the pool when the returned guard drops.
	pub fn get_connection(&self) -> DatabaseResult<PooledConnection> {
		let inner = self.source.acquire()?;
		Ok(PooledConnection {
			inner,
			acquired_at: Instant::now(),
			leak_threshold: self.settings.leak_detection_threshold,
			pool_name: Arc::clone(&self.name),
		})
	}

	/// Release the pool and every connection it holds
	pub fn close(self) {
		info!("Closing {} ({} backend)", self.name, self.kind());
		drop(self.source);
	}

	fn probe(&self) -> DatabaseResult<()> {
		let mut connection = self.get_connection()?;
		let mut statement = connection.prepare(&self.settings.connection_test_query)?;
		statement.query()?;
		debug!("Connection test query succeeded on {}", self.name);
		Ok(())
	}
}

/// A connection checked out of a [`ConnectionPool`]
///
/// Reports a possible leak when it is held past the pool's leak-detection
/// threshold. The check runs when the guard is dropped, so a connection that
/// is never returned is not reported.
pub struct PooledConnection {
	inner: Box<dyn SqlConnection>,
	acquired_at: Instant,
	leak_threshold: Option<Duration>,
	pool_name: Arc<str>,
}

impl PooledConnection {
	pub fn prepare(&mut self, sql: &str) -> DatabaseResult<Box<dyn SqlStatement + '_>> {
		self.inner.prepare(sql)
	}

	/// How long this connection has been checked out
	pub fn held_for(&self) -> Duration {
		self.acquired_at.elapsed()
	}
}

impl Drop for PooledConnection {
	fn drop(&mut self) {
		let held = self.held_for();
		if let Some(threshold) = self.leak_threshold.filter(|t| held > *t) {
			warn!(
				"Connection leak detection triggered on {}: connection held for {:?} (threshold {:?})",
				self.pool_name, held, threshold
			);
		}
	}
}
