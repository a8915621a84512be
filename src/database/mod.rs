//! Database module for persisting placed generators
//!
//! The same statements run against an embedded SQLite file or a networked
//! MySQL server. The backend is picked once, from [`StorageConfig`], when
//! [`GeneratorStore::connect`] opens the connection pool.

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod generators;
pub mod pool;
pub mod schema;
pub mod store;
pub mod types;

pub use backend::{
	BackendConfig, BackendKind, ConnectionSource, EmbeddedBackend, NetworkedBackend, PoolBackend,
	PoolStatus, SqlConnection, SqlStatement,
};
pub use config::{MySqlConfig, PoolSettings, StorageConfig, DEFAULT_DATABASE_PATH};
pub use error::{DatabaseError, DatabaseResult};
pub use executor::{LogFailure, StatementAction};
pub use generators::{BulkSaveReport, SaveOutcome};
pub use pool::{ConnectionPool, PooledConnection};
pub use schema::{GENERATOR_TABLE, USER_TABLE};
pub use store::GeneratorStore;
pub use types::{BlockLocation, GeneratorRecord, ResultSet, Row, SqlValue, UserRecord};
