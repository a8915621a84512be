//! Generator and user record operations
//!
//! Saves are upserts keyed on the unique `location` column, so saving the
//! same generator twice overwrites the first row instead of duplicating it.
//! Records whose location has no world are skipped: they cannot be
//! restored on the next start, so there is nothing worth persisting.

use crate::database::backend::SqlStatement;
use crate::database::error::{DatabaseError, DatabaseResult};
use crate::database::executor::{LogFailure, StatementAction};
use crate::database::store::GeneratorStore;
use crate::database::types::{BlockLocation, GeneratorRecord, SqlValue, UserRecord};
use tracing::{debug, error, info};
use uuid::Uuid;

pub const UPSERT_GENERATOR: &str = "REPLACE INTO nextgens_generator VALUES (?,?,?,?,?);";
pub const DELETE_GENERATOR: &str = "DELETE FROM nextgens_generator WHERE location=?;";
const SELECT_GENERATORS: &str =
	"SELECT owner, location, generator_id, timer, is_corrupted FROM nextgens_generator;";
const SELECT_GENERATOR: &str = "SELECT owner, location, generator_id, timer, is_corrupted \
	FROM nextgens_generator WHERE location=?;";
const COUNT_GENERATORS: &str = "SELECT COUNT(*) FROM nextgens_generator;";
const SELECT_USER_BONUS: &str = "SELECT bonus FROM nextgens_user WHERE uuid=?;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
	Saved,
	/// The record's location has no world
	Skipped,
}

/// Result of a bulk save that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkSaveReport {
	pub saved: usize,
	pub skipped: usize,
}

fn bind_generator(
	statement: &mut dyn SqlStatement, record: &GeneratorRecord,
) -> DatabaseResult<()> {
	statement.bind(1, SqlValue::from(record.owner))?;
	statement.bind(2, SqlValue::from(record.location.serialize()))?;
	statement.bind(3, SqlValue::from(record.generator_id.as_str()))?;
	statement.bind(4, SqlValue::from(record.persisted_timer()))?;
	statement.bind(5, SqlValue::from(record.corrupted))?;
	Ok(())
}

impl GeneratorStore {
	/// Upsert one generator
	pub fn try_save_generator(&self, record: &GeneratorRecord) -> DatabaseResult<SaveOutcome> {
		if !record.is_restorable() {
			debug!("Skipping generator without a world at {}", record.location);
			return Ok(SaveOutcome::Skipped);
		}
		record.validate()?;

		self.build_statement(UPSERT_GENERATOR, |statement| {
			bind_generator(statement, record)?;
			statement.execute()?;
			Ok(SaveOutcome::Saved)
		})
	}

	/// Upsert one generator, logging failures
	pub fn save_generator(&self, record: &GeneratorRecord) -> Option<SaveOutcome> {
		self.try_save_generator(record)
			.or_log(StatementAction::BuildingStatement, UPSERT_GENERATOR)
	}

	/// Upsert many generators over a single pooled connection
	///
	/// Each row commits on its own. The first failure, including a record
	/// with a non-finite timer, stops the batch and is returned; rows written
	/// before it stay written.
	pub fn try_save_generators<'a, I>(&self, records: I) -> DatabaseResult<BulkSaveReport>
	where I: IntoIterator<Item = &'a GeneratorRecord> {
		let mut connection = self.get_connection()?;
		let mut report = BulkSaveReport::default();

		for record in records {
			if !record.is_restorable() {
				report.skipped += 1;
				continue;
			}
			record.validate()?;

			let mut statement = connection.prepare(UPSERT_GENERATOR)?;
			bind_generator(statement.as_mut(), record)?;
			statement.execute()?;
			report.saved += 1;
		}

		info!("Successfully saved {} active generators!", report.saved);
		if report.skipped > 0 {
			debug!("Skipped {} generators without a world", report.skipped);
		}
		Ok(report)
	}

	/// Bulk save, logging a failure once for the whole batch
	pub fn save_generators<'a, I>(&self, records: I) -> Option<BulkSaveReport>
	where I: IntoIterator<Item = &'a GeneratorRecord> {
		match self.try_save_generators(records) {
			Ok(report) => Some(report),
			Err(e) => {
				error!(category = e.category(), "Failed to save all generators! ({})", e);
				None
			}
		}
	}

	/// Delete the generator stored at the record's location
	pub fn try_delete_generator(&self, record: &GeneratorRecord) -> DatabaseResult<u64> {
		self.try_delete_generator_at(&record.location)
	}

	pub fn try_delete_generator_at(&self, location: &BlockLocation) -> DatabaseResult<u64> {
		self.build_statement(DELETE_GENERATOR, |statement| {
			statement.bind(1, SqlValue::from(location.serialize()))?;
			statement.execute()
		})
	}

	/// Delete a generator, logging failures
	pub fn delete_generator(&self, record: &GeneratorRecord) -> Option<u64> {
		self.try_delete_generator(record)
			.or_log(StatementAction::BuildingStatement, DELETE_GENERATOR)
	}

	/// Read every stored generator
	pub fn load_generators(&self) -> DatabaseResult<Vec<GeneratorRecord>> {
		self.execute_query(SELECT_GENERATORS, |result| {
			result.iter().map(GeneratorRecord::from_row).collect()
		})
	}

	pub fn find_generator(
		&self, location: &BlockLocation,
	) -> DatabaseResult<Option<GeneratorRecord>> {
		self.build_statement(SELECT_GENERATOR, |statement| {
			statement.bind(1, SqlValue::from(location.serialize()))?;
			let result = statement.query()?;
			result.first().map(GeneratorRecord::from_row).transpose()
		})
	}

	pub fn count_generators(&self) -> DatabaseResult<u64> {
		self.execute_query(COUNT_GENERATORS, |result| match result.first() {
			Some(row) => Ok(row.get_i64(0)?.max(0) as u64),
			None => Ok(0),
		})
	}

	/// Bonus row of a player, if the player has one
	pub fn load_user(&self, uuid: Uuid) -> DatabaseResult<Option<UserRecord>> {
		self.build_statement(SELECT_USER_BONUS, |statement| {
			statement.bind(1, SqlValue::from(uuid))?;
			let result = statement.query()?;
			result
				.first()
				.map(|row| {
					let bonus = row.get_i64(0)?;
					let bonus = i32::try_from(bonus).map_err(|_| {
						DatabaseError::Deserialization(format!(
							"bonus {bonus} of user {uuid} is out of range"
						))
					})?;
					Ok(UserRecord { uuid, bonus })
				})
				.transpose()
		})
	}
}
