//! Common test utilities for the generator store

#![allow(dead_code)]

use nextgens_store::database::{
	BackendKind, ConnectionPool, ConnectionSource, EmbeddedBackend, PoolBackend, PoolSettings,
	PoolStatus, SqlConnection, SqlStatement,
};
use nextgens_store::{BlockLocation, DatabaseResult, GeneratorRecord, GeneratorStore, StorageConfig};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

/// Open an embedded store in a fresh temp directory with both tables created
pub fn create_test_store() -> (TempDir, GeneratorStore) {
	let temp_dir = setup_temp_dir();
	let config = StorageConfig::embedded(temp_dir.path().join("generators.db"));
	let store = GeneratorStore::connect(&config).expect("Failed to open store");
	assert!(store.initialize_schema());
	(temp_dir, store)
}

pub fn generator_at(world: &str, x: i32, y: i32, z: i32, kind: &str, timer: f64) -> GeneratorRecord {
	GeneratorRecord::new(Uuid::new_v4(), BlockLocation::new(world, x, y, z), kind, timer)
}

/// Generators in a straight line along the x axis
pub fn generate_generators(count: usize) -> Vec<GeneratorRecord> {
	(0..count).map(|i| generator_at("world", i as i32, 64, 0, "stone", i as f64 * 0.5)).collect()
}

/// Counts pool checkouts and prepared statements
#[derive(Debug, Default)]
pub struct Counters {
	pub acquisitions: AtomicUsize,
	pub statements: AtomicUsize,
}

impl Counters {
	pub fn acquisitions(&self) -> usize {
		self.acquisitions.load(Ordering::SeqCst)
	}

	pub fn statements(&self) -> usize {
		self.statements.load(Ordering::SeqCst)
	}
}

/// Connection source wrapper that records how it is used
pub struct CountingSource {
	inner: Box<dyn ConnectionSource>,
	counters: Arc<Counters>,
}

impl ConnectionSource for CountingSource {
	fn kind(&self) -> BackendKind {
		self.inner.kind()
	}

	fn acquire(&self) -> DatabaseResult<Box<dyn SqlConnection>> {
		self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
		let inner = self.inner.acquire()?;
		Ok(Box::new(CountingConnection { inner, counters: Arc::clone(&self.counters) }))
	}

	fn status(&self) -> PoolStatus {
		self.inner.status()
	}
}

struct CountingConnection {
	inner: Box<dyn SqlConnection>,
	counters: Arc<Counters>,
}

impl SqlConnection for CountingConnection {
	fn prepare(&mut self, sql: &str) -> DatabaseResult<Box<dyn SqlStatement + '_>> {
		self.counters.statements.fetch_add(1, Ordering::SeqCst);
		self.inner.prepare(sql)
	}
}

/// Embedded store whose pool usage is observable through the returned counters
pub fn create_counting_store() -> (TempDir, GeneratorStore, Arc<Counters>) {
	let temp_dir = setup_temp_dir();
	let settings = PoolSettings::for_embedded();
	let inner = EmbeddedBackend::new(temp_dir.path().join("counting.db"))
		.open_pool(&settings)
		.expect("Failed to open pool");

	let counters = Arc::new(Counters::default());
	let source = CountingSource { inner, counters: Arc::clone(&counters) };
	let store = GeneratorStore::with_pool(ConnectionPool::from_source(Box::new(source), settings));
	assert!(store.initialize_schema());

	counters.acquisitions.store(0, Ordering::SeqCst);
	counters.statements.store(0, Ordering::SeqCst);
	(temp_dir, store, counters)
}

/// Make every upsert of `generator_id` fail inside the driver
pub fn poison_generator_id(store: &GeneratorStore, generator_id: &str) {
	store
		.execute_update(&format!(
			"CREATE TRIGGER reject_{generator_id} BEFORE INSERT ON nextgens_generator \
			 WHEN NEW.generator_id = '{generator_id}' \
			 BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
		))
		.expect("Failed to create trigger");
}

/// Log output written while `f` runs on the current thread
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
	let buffer = Arc::new(Mutex::new(Vec::new()));
	let writer = {
		let buffer = Arc::clone(&buffer);
		move || LogBuffer(Arc::clone(&buffer))
	};
	let subscriber = tracing_subscriber::fmt().with_writer(writer).with_ansi(false).finish();

	let value = tracing::subscriber::with_default(subscriber, f);
	let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
	(value, logs)
}

struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}
