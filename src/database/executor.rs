//! Statement primitives
//!
//! Every primitive checks a connection out of the pool, prepares the
//! statement, runs it and releases both on every exit path: the statement
//! and the [`PooledConnection`](crate::database::PooledConnection) are
//! dropped in reverse order whether the body returns `Ok`, an error from the
//! driver, or an error from the caller's closure.
//!
//! Errors are returned, never panicked. Callers that only want the
//! "log and carry on" behaviour use [`LogFailure::or_log`].

use crate::database::backend::SqlStatement;
use crate::database::error::DatabaseResult;
use crate::database::store::GeneratorStore;
use crate::database::types::ResultSet;
use tracing::{debug, error};

impl GeneratorStore {
	/// Run a statement that returns no rows
	pub fn execute_update(&self, sql: &str) -> DatabaseResult<u64> {
		let mut connection = self.get_connection()?;
		let mut statement = connection.prepare(sql)?;
		let affected = statement.execute()?;
		debug!("Statement affected {} rows: {}", affected, sql);
		Ok(affected)
	}

	/// Run a query and hand its rows to `on_result`
	pub fn execute_query<T, F>(&self, sql: &str, on_result: F) -> DatabaseResult<T>
	where F: FnOnce(&ResultSet) -> DatabaseResult<T> {
		let mut connection = self.get_connection()?;
		let mut statement = connection.prepare(sql)?;
		let result = statement.query()?;
		on_result(&result)
	}

	/// Prepare a statement and let `on_statement` bind and run it
	pub fn build_statement<T, F>(&self, sql: &str, on_statement: F) -> DatabaseResult<T>
	where F: FnOnce(&mut dyn SqlStatement) -> DatabaseResult<T> {
		let mut connection = self.get_connection()?;
		let mut statement = connection.prepare(sql)?;
		on_statement(statement.as_mut())
	}
}

/// What a statement was doing when it failed, for the default failure log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementAction {
	RunningStatement,
	BuildingStatement,
}

impl StatementAction {
	fn describe(&self) -> &'static str {
		match self {
			StatementAction::RunningStatement => "running statement",
			StatementAction::BuildingStatement => "building statement",
		}
	}
}

/// Default failure handler: log the statement and error, then continue
pub trait LogFailure<T> {
	fn or_log(self, action: StatementAction, sql: &str) -> Option<T>;
}

impl<T> LogFailure<T> for DatabaseResult<T> {
	fn or_log(self, action: StatementAction, sql: &str) -> Option<T> {
		match self {
			Ok(value) => Some(value),
			Err(e) => {
				error!(
					category = e.category(),
					"An error occurred while {}: {} ({})",
					action.describe(),
					sql,
					e
				);
				None
			}
		}
	}
}
