//! Embedded SQLite backend

use super::{
	pool_builder, BackendKind, ConnectionSource, PoolBackend, PoolStatus, SqlConnection,
	SqlStatement,
};
use crate::database::config::PoolSettings;
use crate::database::error::{DatabaseError, DatabaseResult};
use crate::database::types::{ResultSet, Row, SqlValue};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{Value, ValueRef};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// SQLite database stored in a single file
#[derive(Debug, Clone)]
pub struct EmbeddedBackend {
	path: PathBuf,
}

impl EmbeddedBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Create the database file, and its directory, if absent
	fn ensure_file(&self) -> DatabaseResult<()> {
		if self.path.exists() {
			return Ok(());
		}

		let created = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			Some(parent) => fs::create_dir_all(parent),
			None => Ok(()),
		}
		.and_then(|_| OpenOptions::new().create(true).append(true).open(&self.path).map(|_| ()));

		created.map_err(|source| {
			error!("Failed to create the database file, stopping the server!");
			DatabaseError::DatabaseFileCreation { path: self.path.clone(), source }
		})?;

		debug!("Created database file at: {:?}", self.path);
		Ok(())
	}
}

impl PoolBackend for EmbeddedBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Embedded
	}

	fn open_pool(&self, settings: &PoolSettings) -> DatabaseResult<Box<dyn ConnectionSource>> {
		self.ensure_file()?;

		let busy_timeout = settings.connection_timeout;
		let manager = SqliteConnectionManager::file(&self.path).with_init(move |conn| {
			conn.busy_timeout(busy_timeout)?;
			conn.execute_batch("PRAGMA encoding = 'UTF-8';")
		});

		let pool = pool_builder(settings)
			.build(manager)
			.map_err(|e| DatabaseError::ConnectionFailed(format!("{:?}: {}", self.path, e)))?;

		Ok(Box::new(SqliteSource { pool }))
	}
}

struct SqliteSource {
	pool: Pool<SqliteConnectionManager>,
}

impl ConnectionSource for SqliteSource {
	fn kind(&self) -> BackendKind {
		BackendKind::Embedded
	}

	fn acquire(&self) -> DatabaseResult<Box<dyn SqlConnection>> {
		Ok(Box::new(SqliteConnection(self.pool.get()?)))
	}

	fn status(&self) -> PoolStatus {
		let state = self.pool.state();
		PoolStatus { connections: state.connections, idle: state.idle_connections }
	}
}

struct SqliteConnection(PooledConnection<SqliteConnectionManager>);

impl SqlConnection for SqliteConnection {
	fn prepare(&mut self, sql: &str) -> DatabaseResult<Box<dyn SqlStatement + '_>> {
		let statement = self.0.prepare(sql)?;
		Ok(Box::new(SqliteStatement { statement }))
	}
}

struct SqliteStatement<'c> {
	statement: rusqlite::Statement<'c>,
}

impl SqlStatement for SqliteStatement<'_> {
	fn bind(&mut self, index: usize, value: SqlValue) -> DatabaseResult<()> {
		self.statement.raw_bind_parameter(index, to_sqlite(value))?;
		Ok(())
	}

	fn execute(&mut self) -> DatabaseResult<u64> {
		Ok(self.statement.raw_execute()? as u64)
	}

	fn query(&mut self) -> DatabaseResult<ResultSet> {
		let columns: Vec<String> =
			self.statement.column_names().into_iter().map(String::from).collect();
		let width = columns.len();

		let mut rows = Vec::new();
		let mut cursor = self.statement.raw_query();
		while let Some(row) = cursor.next()? {
			let mut values = Vec::with_capacity(width);
			for index in 0..width {
				values.push(from_sqlite(row.get_ref(index)?));
			}
			rows.push(Row::new(values));
		}

		Ok(ResultSet::new(columns, rows))
	}
}

fn to_sqlite(value: SqlValue) -> Value {
	match value {
		SqlValue::Null => Value::Null,
		SqlValue::Integer(v) => Value::Integer(v),
		SqlValue::Real(v) => Value::Real(v),
		SqlValue::Text(v) => Value::Text(v),
		SqlValue::Blob(v) => Value::Blob(v),
	}
}

fn from_sqlite(value: ValueRef<'_>) -> SqlValue {
	match value {
		ValueRef::Null => SqlValue::Null,
		ValueRef::Integer(v) => SqlValue::Integer(v),
		ValueRef::Real(v) => SqlValue::Real(v),
		ValueRef::Text(v) => SqlValue::Text(String::from_utf8_lossy(v).into_owned()),
		ValueRef::Blob(v) => SqlValue::Blob(v.to_vec()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_creates_missing_file_and_directory() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let path = temp_dir.path().join("plugins").join("NextGens").join("generators.db");
		let backend = EmbeddedBackend::new(&path);

		let source = backend.open_pool(&PoolSettings::for_embedded()).unwrap();
		assert!(path.exists());
		assert_eq!(source.kind(), BackendKind::Embedded);
		assert_eq!(source.status().connections, 1);
	}

	#[test]
	fn test_values_survive_the_driver() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let backend = EmbeddedBackend::new(temp_dir.path().join("values.db"));
		let source = backend.open_pool(&PoolSettings::for_embedded()).unwrap();

		let mut connection = source.acquire().unwrap();
		let mut statement = connection.prepare("SELECT ?, ?, ?, ?, ?").unwrap();
		statement.bind(1, SqlValue::Null).unwrap();
		statement.bind(2, SqlValue::Integer(42)).unwrap();
		statement.bind(3, SqlValue::Real(2.5)).unwrap();
		statement.bind(4, SqlValue::from("text")).unwrap();
		statement.bind(5, SqlValue::Blob(vec![1, 2, 3])).unwrap();

		let result = statement.query().unwrap();
		assert_eq!(result.len(), 1);
		let row = result.first().unwrap();
		assert_eq!(row.get(0).unwrap(), &SqlValue::Null);
		assert_eq!(row.get_i64(1).unwrap(), 42);
		assert_eq!(row.get_f64(2).unwrap(), 2.5);
		assert_eq!(row.get_str(3).unwrap(), "text");
		assert_eq!(row.get(4).unwrap(), &SqlValue::Blob(vec![1, 2, 3]));
	}

	#[test]
	fn test_bad_parameter_index_is_an_error() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let backend = EmbeddedBackend::new(temp_dir.path().join("index.db"));
		let source = backend.open_pool(&PoolSettings::for_embedded()).unwrap();

		let mut connection = source.acquire().unwrap();
		let mut statement = connection.prepare("SELECT ?").unwrap();
		assert!(statement.bind(2, SqlValue::Integer(1)).is_err());
	}
}
