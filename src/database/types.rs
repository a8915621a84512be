//! Type definitions for database storage

use crate::database::error::{DatabaseError, DatabaseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A block position inside a named world
///
/// `world` is `None` when the world the generator was placed in is not
/// loaded. Such locations cannot be restored and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
	pub world: Option<String>,
	pub x: i32,
	pub y: i32,
	pub z: i32,
}

impl BlockLocation {
	pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
		Self { world: Some(world.into()), x, y, z }
	}

	/// A location whose world could not be resolved
	pub fn unresolved(x: i32, y: i32, z: i32) -> Self {
		Self { world: None, x, y, z }
	}

	/// Whether the location still points into a known world
	pub fn has_world(&self) -> bool {
		self.world.as_deref().is_some_and(|w| !w.is_empty())
	}

	/// Serialize to the `world,x,y,z` form used as the unique row key
	pub fn serialize(&self) -> String {
		format!("{},{},{},{}", self.world.as_deref().unwrap_or(""), self.x, self.y, self.z)
	}

	/// Parse the `world,x,y,z` form back into a location
	///
	/// Coordinates are taken from the right, so a world name may itself
	/// contain commas.
	pub fn parse(raw: &str) -> DatabaseResult<Self> {
		let mut parts = raw.rsplitn(4, ',');
		let (Some(z), Some(y), Some(x), Some(world)) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(DatabaseError::Deserialization(format!(
				"location '{raw}' must have the form world,x,y,z"
			)));
		};

		let coordinate = |value: &str| {
			value.trim().parse::<i32>().map_err(|e| {
				DatabaseError::Deserialization(format!("bad coordinate '{value}' in '{raw}': {e}"))
			})
		};

		Ok(Self {
			world: (!world.is_empty()).then(|| world.to_string()),
			x: coordinate(x)?,
			y: coordinate(y)?,
			z: coordinate(z)?,
		})
	}
}

impl fmt::Display for BlockLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.serialize())
	}
}

/// Persistent state of one placed generator (a row in `nextgens_generator`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorRecord {
	/// Player that placed the generator
	pub owner: Uuid,

	/// Where the generator sits; unique across all records
	pub location: BlockLocation,

	/// Id of the generator definition
	pub generator_id: String,

	/// Countdown until the next drop, in seconds
	pub timer: f64,

	/// Whether the generator is corrupted and needs repair
	#[serde(default)]
	pub corrupted: bool,
}

impl GeneratorRecord {
	pub fn new(
		owner: Uuid, location: BlockLocation, generator_id: impl Into<String>, timer: f64,
	) -> Self {
		Self { owner, location, generator_id: generator_id.into(), timer, corrupted: false }
	}

	/// Records without a resolvable world are skipped on save
	pub fn is_restorable(&self) -> bool {
		self.location.has_world()
	}

	/// Reject values that would be stored but could not be read back
	pub fn validate(&self) -> DatabaseResult<()> {
		if !self.persisted_timer().is_finite() {
			return Err(DatabaseError::InvalidRecord(format!(
				"generator at {} has a non-finite timer ({})",
				self.location, self.timer
			)));
		}
		Ok(())
	}

	/// Timer rounded to the two decimals the column stores
	pub fn persisted_timer(&self) -> f64 {
		(self.timer * 100.0).round() / 100.0
	}

	/// Rebuild a record from an `owner, location, generator_id, timer, is_corrupted` row
	pub fn from_row(row: &Row) -> DatabaseResult<Self> {
		let owner = row.get_str(0)?;
		let owner = Uuid::parse_str(owner).map_err(|e| {
			DatabaseError::Deserialization(format!("invalid owner uuid '{owner}': {e}"))
		})?;

		Ok(Self {
			owner,
			location: BlockLocation::parse(row.get_str(1)?)?,
			generator_id: row.get_str(2)?.to_string(),
			timer: row.get_f64(3)?,
			corrupted: row.get_bool(4)?,
		})
	}
}

/// Bonus counter of one player (a row in `nextgens_user`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	pub uuid: Uuid,
	pub bonus: i32,
}

/// A value bound to, or read from, a statement
///
/// Both backends map their native types onto this set so that statements
/// can be built without knowing which backend runs them.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Integer(i64),
	Real(f64),
	Text(String),
	Blob(Vec<u8>),
}

impl SqlValue {
	fn type_name(&self) -> &'static str {
		match self {
			SqlValue::Null => "NULL",
			SqlValue::Integer(_) => "INTEGER",
			SqlValue::Real(_) => "REAL",
			SqlValue::Text(_) => "TEXT",
			SqlValue::Blob(_) => "BLOB",
		}
	}
}

impl From<&str> for SqlValue {
	fn from(value: &str) -> Self {
		SqlValue::Text(value.to_string())
	}
}

impl From<String> for SqlValue {
	fn from(value: String) -> Self {
		SqlValue::Text(value)
	}
}

impl From<i64> for SqlValue {
	fn from(value: i64) -> Self {
		SqlValue::Integer(value)
	}
}

impl From<i32> for SqlValue {
	fn from(value: i32) -> Self {
		SqlValue::Integer(value.into())
	}
}

impl From<f64> for SqlValue {
	fn from(value: f64) -> Self {
		SqlValue::Real(value)
	}
}

impl From<bool> for SqlValue {
	fn from(value: bool) -> Self {
		SqlValue::Integer(i64::from(value))
	}
}

impl From<Uuid> for SqlValue {
	fn from(value: Uuid) -> Self {
		SqlValue::Text(value.to_string())
	}
}

/// One row of a [`ResultSet`]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
	values: Vec<SqlValue>,
}

impl Row {
	pub fn new(values: Vec<SqlValue>) -> Self {
		Self { values }
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn get(&self, index: usize) -> DatabaseResult<&SqlValue> {
		self.values.get(index).ok_or_else(|| {
			DatabaseError::Deserialization(format!(
				"column {index} out of range ({} columns)",
				self.values.len()
			))
		})
	}

	pub fn get_str(&self, index: usize) -> DatabaseResult<&str> {
		match self.get(index)? {
			SqlValue::Text(text) => Ok(text),
			other => Err(mismatch(index, "TEXT", other)),
		}
	}

	pub fn get_i64(&self, index: usize) -> DatabaseResult<i64> {
		match self.get(index)? {
			SqlValue::Integer(value) => Ok(*value),
			SqlValue::Text(text) => {
				text.trim().parse().map_err(|_| mismatch(index, "INTEGER", &SqlValue::Text(text.clone())))
			}
			other => Err(mismatch(index, "INTEGER", other)),
		}
	}

	/// DECIMAL columns come back as REAL, as INTEGER when SQLite stores a
	/// whole number, or as text from MySQL
	pub fn get_f64(&self, index: usize) -> DatabaseResult<f64> {
		match self.get(index)? {
			SqlValue::Real(value) => Ok(*value),
			SqlValue::Integer(value) => Ok(*value as f64),
			SqlValue::Text(text) => {
				text.trim().parse().map_err(|_| mismatch(index, "REAL", &SqlValue::Text(text.clone())))
			}
			other => Err(mismatch(index, "REAL", other)),
		}
	}

	pub fn get_bool(&self, index: usize) -> DatabaseResult<bool> {
		Ok(self.get_i64(index)? != 0)
	}
}

fn mismatch(index: usize, expected: &str, found: &SqlValue) -> DatabaseError {
	DatabaseError::Deserialization(format!(
		"column {index}: expected {expected}, found {} ({found:?})",
		found.type_name()
	))
}

/// Fully read result of a query
///
/// Rows are copied out of the backend cursor before the connection goes
/// back to the pool, so a `ResultSet` never outlives its statement's scope
/// with a live cursor behind it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
	columns: Vec<String>,
	rows: Vec<Row>,
}

impl ResultSet {
	pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
		Self { columns, rows }
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
	}

	pub fn rows(&self) -> &[Row] {
		&self.rows
	}

	pub fn first(&self) -> Option<&Row> {
		self.rows.first()
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Row> {
		self.rows.iter()
	}
}
