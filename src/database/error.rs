//! Error types for database operations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
	#[error("Failed to create database file {path:?}: {source}")]
	DatabaseFileCreation {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Database connection failed: {0}")]
	ConnectionFailed(String),

	#[error("Timed out acquiring a pooled connection: {0}")]
	ConnectionTimeout(#[from] r2d2::Error),

	#[error("Statement failed: {0}")]
	Statement(String),

	#[error("Deserialization error: {0}")]
	Deserialization(String),

	#[error("Invalid record: {0}")]
	InvalidRecord(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("SQLite error: {0}")]
	Sqlite(#[from] rusqlite::Error),

	#[error("MySQL error: {0}")]
	MySql(#[from] mysql::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),
}

impl DatabaseError {
	/// Errors after which the owning process has no safe way to keep running
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			DatabaseError::DatabaseFileCreation { .. } | DatabaseError::ConnectionFailed(_)
		)
	}

	/// Errors caused by the pool or the network rather than the statement
	pub fn is_connectivity(&self) -> bool {
		match self {
			DatabaseError::ConnectionFailed(_) | DatabaseError::ConnectionTimeout(_) => true,
			DatabaseError::MySql(err) => {
				matches!(err, mysql::Error::IoError(_) | mysql::Error::DriverError(_))
			}
			_ => false,
		}
	}

	/// Check if this error indicates that the operation should be retried
	pub fn is_retryable(&self) -> bool {
		match self {
			DatabaseError::ConnectionTimeout(_) => true,
			DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
				err.code,
				rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
			),
			DatabaseError::MySql(mysql::Error::IoError(_)) => true,
			_ => false,
		}
	}

	/// Short category name for log fields
	pub fn category(&self) -> &'static str {
		match self {
			DatabaseError::DatabaseFileCreation { .. } => "fatal",
			DatabaseError::ConnectionFailed(_) | DatabaseError::ConnectionTimeout(_) => {
				"connectivity"
			}
			DatabaseError::MySql(_) if self.is_connectivity() => "connectivity",
			DatabaseError::Statement(_)
			| DatabaseError::Sqlite(_)
			| DatabaseError::MySql(_) => "statement",
			DatabaseError::Deserialization(_)
			| DatabaseError::InvalidRecord(_)
			| DatabaseError::Json(_) => "serialization",
			DatabaseError::IoError(_) => "io",
			DatabaseError::InvalidConfiguration(_) => "configuration",
		}
	}
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
