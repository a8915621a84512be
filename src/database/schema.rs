//! Table definitions
//!
//! Both statements use `CREATE TABLE IF NOT EXISTS` and are run on every
//! startup. The column layout is shared by SQLite and MySQL, except that
//! MySQL cannot put a unique index on an unbounded `TEXT` column, so the
//! location key is a `VARCHAR(255)` there.

use crate::database::backend::BackendKind;
use crate::database::executor::{LogFailure, StatementAction};
use crate::database::store::GeneratorStore;
use tracing::info;

pub const GENERATOR_TABLE: &str = "nextgens_generator";
pub const USER_TABLE: &str = "nextgens_user";

pub const CREATE_GENERATOR_TABLE: &str = "CREATE TABLE IF NOT EXISTS nextgens_generator (\
	owner VARCHAR(255), \
	location TEXT UNIQUE, \
	generator_id TEXT, \
	timer DECIMAL(18,2), \
	is_corrupted INT\
	);";

pub const CREATE_GENERATOR_TABLE_MYSQL: &str = "CREATE TABLE IF NOT EXISTS nextgens_generator (\
	owner VARCHAR(255), \
	location VARCHAR(255) UNIQUE, \
	generator_id TEXT, \
	timer DECIMAL(18,2), \
	is_corrupted INT\
	);";

pub const CREATE_USER_TABLE: &str = "CREATE TABLE IF NOT EXISTS nextgens_user (\
	uuid VARCHAR(255) UNIQUE, \
	bonus INT\
	);";

impl GeneratorStore {
	/// Returns whether the statement ran; failures are logged, never fatal
	pub fn create_generator_table(&self) -> bool {
		let sql = match self.backend_kind() {
			BackendKind::Embedded => CREATE_GENERATOR_TABLE,
			BackendKind::Networked => CREATE_GENERATOR_TABLE_MYSQL,
		};
		self.execute_update(sql).or_log(StatementAction::RunningStatement, sql).is_some()
	}

	/// Returns whether the statement ran; failures are logged, never fatal
	pub fn create_user_table(&self) -> bool {
		self.execute_update(CREATE_USER_TABLE)
			.or_log(StatementAction::RunningStatement, CREATE_USER_TABLE)
			.is_some()
	}

	/// Create both tables
	pub fn initialize_schema(&self) -> bool {
		let generators = self.create_generator_table();
		let users = self.create_user_table();
		if generators && users {
			info!("Initialized {} and {} tables", GENERATOR_TABLE, USER_TABLE);
		}
		generators && users
	}
}
