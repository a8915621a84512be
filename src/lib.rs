pub mod database;

pub use database::{
	BlockLocation, BulkSaveReport, DatabaseError, DatabaseResult, GeneratorRecord, GeneratorStore,
	SaveOutcome, StorageConfig,
};
