//! Networked MySQL backend

use super::{
	pool_builder, BackendKind, ConnectionSource, PoolBackend, PoolStatus, SqlConnection,
	SqlStatement,
};
use crate::database::config::PoolSettings;
use crate::database::error::{DatabaseError, DatabaseResult};
use crate::database::types::{ResultSet, Row, SqlValue};
use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Params, SslOpts, Value};
use r2d2::{Pool, PooledConnection};
use r2d2_mysql::MySqlConnectionManager;
use std::fmt;

/// MySQL server reached over TCP
#[derive(Clone)]
pub struct NetworkedBackend {
	host: String,
	port: u16,
	database: String,
	user: String,
	password: String,
	use_ssl: bool,
}

impl NetworkedBackend {
	pub fn new(
		host: impl Into<String>, port: u16, database: impl Into<String>, user: impl Into<String>,
		password: impl Into<String>, use_ssl: bool,
	) -> Self {
		Self {
			host: host.into(),
			port,
			database: database.into(),
			user: user.into(),
			password: password.into(),
			use_ssl,
		}
	}

	/// Connection URL without credentials, safe to log
	pub fn connection_url(&self) -> String {
		format!(
			"mysql://{}:{}/{}?require_ssl={}",
			self.host, self.port, self.database, self.use_ssl
		)
	}

	fn options(&self, settings: &PoolSettings) -> OptsBuilder {
		let options = OptsBuilder::new()
			.ip_or_hostname(Some(self.host.clone()))
			.tcp_port(self.port)
			.db_name(Some(self.database.clone()))
			.user(Some(self.user.clone()))
			.pass(Some(self.password.clone()))
			.init(vec![format!("SET NAMES {}", settings.character_encoding)]);

		if self.use_ssl {
			options.ssl_opts(Some(SslOpts::default()))
		} else {
			options
		}
	}
}

impl fmt::Debug for NetworkedBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NetworkedBackend")
			.field("url", &self.connection_url())
			.field("user", &self.user)
			.finish_non_exhaustive()
	}
}

impl PoolBackend for NetworkedBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Networked
	}

	fn open_pool(&self, settings: &PoolSettings) -> DatabaseResult<Box<dyn ConnectionSource>> {
		let manager = MySqlConnectionManager::new(self.options(settings));

		let pool = pool_builder(settings).build(manager).map_err(|e| {
			DatabaseError::ConnectionFailed(format!("{}: {}", self.connection_url(), e))
		})?;

		Ok(Box::new(MySqlSource { pool }))
	}
}

struct MySqlSource {
	pool: Pool<MySqlConnectionManager>,
}

impl ConnectionSource for MySqlSource {
	fn kind(&self) -> BackendKind {
		BackendKind::Networked
	}

	fn acquire(&self) -> DatabaseResult<Box<dyn SqlConnection>> {
		Ok(Box::new(MySqlConnection(self.pool.get()?)))
	}

	fn status(&self) -> PoolStatus {
		let state = self.pool.state();
		PoolStatus { connections: state.connections, idle: state.idle_connections }
	}
}

struct MySqlConnection(PooledConnection<MySqlConnectionManager>);

impl SqlConnection for MySqlConnection {
	fn prepare(&mut self, sql: &str) -> DatabaseResult<Box<dyn SqlStatement + '_>> {
		let conn: &mut mysql::Conn = &mut *self.0;
		let statement = conn.prep(sql)?;
		let params = vec![Value::NULL; usize::from(statement.num_params())];
		Ok(Box::new(MySqlStatement { conn, statement, params }))
	}
}

/// Server-side prepared statement plus the parameters bound so far
///
/// The driver caches prepared statements per connection, so nothing needs
/// closing explicitly on drop.
struct MySqlStatement<'c> {
	conn: &'c mut mysql::Conn,
	statement: mysql::Statement,
	params: Vec<Value>,
}

impl MySqlStatement<'_> {
	fn params(&self) -> Params {
		if self.params.is_empty() {
			Params::Empty
		} else {
			Params::Positional(self.params.clone())
		}
	}
}

impl SqlStatement for MySqlStatement<'_> {
	fn bind(&mut self, index: usize, value: SqlValue) -> DatabaseResult<()> {
		let count = self.params.len();
		let slot = index.checked_sub(1).and_then(|i| self.params.get_mut(i)).ok_or_else(|| {
			DatabaseError::Statement(format!("parameter index {index} out of range (1..={count})"))
		})?;
		*slot = to_mysql(value);
		Ok(())
	}

	fn execute(&mut self) -> DatabaseResult<u64> {
		let params = self.params();
		self.conn.exec_drop(&self.statement, params)?;
		Ok(self.conn.affected_rows())
	}

	fn query(&mut self) -> DatabaseResult<ResultSet> {
		let columns: Vec<String> =
			self.statement.columns().iter().map(|c| c.name_str().into_owned()).collect();

		let params = self.params();
		let fetched: Vec<mysql::Row> = self.conn.exec(&self.statement, params)?;
		let rows = fetched
			.into_iter()
			.map(|row| {
				let values = row.unwrap_raw().into_iter();
				Row::new(values.map(|value| value.map_or(SqlValue::Null, from_mysql)).collect())
			})
			.collect();

		Ok(ResultSet::new(columns, rows))
	}
}

fn to_mysql(value: SqlValue) -> Value {
	match value {
		SqlValue::Null => Value::NULL,
		SqlValue::Integer(v) => Value::Int(v),
		SqlValue::Real(v) => Value::Double(v),
		SqlValue::Text(v) => Value::Bytes(v.into_bytes()),
		SqlValue::Blob(v) => Value::Bytes(v),
	}
}

fn from_mysql(value: Value) -> SqlValue {
	match value {
		Value::NULL => SqlValue::Null,
		Value::Bytes(bytes) => match String::from_utf8(bytes) {
			Ok(text) => SqlValue::Text(text),
			Err(e) => SqlValue::Blob(e.into_bytes()),
		},
		Value::Int(v) => SqlValue::Integer(v),
		Value::UInt(v) => {
			i64::try_from(v).map(SqlValue::Integer).unwrap_or(SqlValue::Real(v as f64))
		}
		Value::Float(v) => SqlValue::Real(f64::from(v)),
		Value::Double(v) => SqlValue::Real(v),
		Value::Date(year, month, day, hour, minute, second, _) => SqlValue::Text(format!(
			"{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
		)),
		Value::Time(negative, days, hours, minutes, seconds, _) => SqlValue::Text(format!(
			"{}{}:{minutes:02}:{seconds:02}",
			if negative { "-" } else { "" },
			days * 24 + u32::from(hours)
		)),
	}
}
