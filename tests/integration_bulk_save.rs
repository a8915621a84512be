//! Integration tests for the bulk save path used at checkpoints

mod common;

use common::{
	create_counting_store, create_test_store, generate_generators, generator_at,
	poison_generator_id,
};
use nextgens_store::{BlockLocation, BulkSaveReport, GeneratorRecord};
use uuid::Uuid;

#[test]
fn test_bulk_save_uses_one_connection() {
	let (_temp_dir, store, counters) = create_counting_store();
	let records = generate_generators(25);

	let report = store.try_save_generators(&records).unwrap();
	assert_eq!(report, BulkSaveReport { saved: 25, skipped: 0 });
	assert_eq!(counters.acquisitions(), 1);
	assert_eq!(counters.statements(), 25);

	assert_eq!(store.count_generators().unwrap(), 25);
}

#[test]
fn test_bulk_save_of_nothing() {
	let (_temp_dir, store, counters) = create_counting_store();

	let records: Vec<GeneratorRecord> = Vec::new();
	let report = store.save_generators(&records).unwrap();
	assert_eq!(report, BulkSaveReport::default());
	assert_eq!(counters.acquisitions(), 1);
	assert_eq!(counters.statements(), 0);
}

#[test]
fn test_bulk_save_skips_worldless_records() {
	let (_temp_dir, store, counters) = create_counting_store();
	let mut records = generate_generators(4);
	records.insert(
		2,
		GeneratorRecord::new(Uuid::new_v4(), BlockLocation::unresolved(0, 0, 0), "stone", 0.0),
	);

	let report = store.save_generators(&records).unwrap();
	assert_eq!(report, BulkSaveReport { saved: 4, skipped: 1 });
	assert_eq!(counters.statements(), 4);
	assert_eq!(store.count_generators().unwrap(), 4);
}

#[test]
fn test_bulk_save_overwrites_existing_rows() {
	let (_temp_dir, store) = create_test_store();
	let mut records = generate_generators(10);
	store.try_save_generators(&records).unwrap();

	for record in &mut records {
		record.timer += 1.0;
	}
	store.try_save_generators(&records).unwrap();

	let mut stored = store.load_generators().unwrap();
	stored.sort_by_key(|r| r.location.x);
	assert_eq!(stored, records);
}

#[test]
fn test_bulk_save_stops_at_first_failure() {
	let (_temp_dir, store) = create_test_store();
	poison_generator_id(&store, "poison");

	let records = vec![
		generator_at("world", 0, 64, 0, "stone", 1.0),
		generator_at("world", 1, 64, 0, "stone", 2.0),
		generator_at("world", 2, 64, 0, "poison", 3.0),
		generator_at("world", 3, 64, 0, "stone", 4.0),
	];

	let err = store.try_save_generators(&records).unwrap_err();
	assert!(!err.is_fatal());
	assert_eq!(err.category(), "statement");

	// Rows before the failure stay committed, rows after it are never written
	let mut stored = store.load_generators().unwrap();
	stored.sort_by_key(|r| r.location.x);
	assert_eq!(stored, records[..2].to_vec());

	// The logging variant swallows the same failure
	assert!(store.save_generators(&records).is_none());
	assert_eq!(store.count_generators().unwrap(), 2);
}

#[test]
fn test_single_save_failure_is_logged() {
	let (_temp_dir, store) = create_test_store();
	poison_generator_id(&store, "poison");

	let record = generator_at("world", 0, 0, 0, "poison", 0.0);
	assert!(store.try_save_generator(&record).is_err());
	assert_eq!(store.save_generator(&record), None);
	assert_eq!(store.count_generators().unwrap(), 0);
}

#[test]
fn test_bulk_save_stops_at_non_finite_timer() {
	let (_temp_dir, store) = create_test_store();
	let records = vec![
		generator_at("world", 0, 64, 0, "stone", 1.0),
		generator_at("world", 1, 64, 0, "stone", f64::INFINITY),
		generator_at("world", 2, 64, 0, "stone", 3.0),
	];

	let err = store.try_save_generators(&records).unwrap_err();
	assert_eq!(err.category(), "serialization");
	assert_eq!(store.load_generators().unwrap(), records[..1].to_vec());
}
