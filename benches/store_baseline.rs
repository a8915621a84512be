//! Generator store benchmarks
//!
//! Compares saving a checkpoint one generator at a time against the bulk
//! path that reuses a single pooled connection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nextgens_store::{BlockLocation, GeneratorRecord, GeneratorStore, StorageConfig};
use tempfile::TempDir;
use uuid::Uuid;

fn open_store(temp_dir: &TempDir) -> GeneratorStore {
	let config = StorageConfig::embedded(temp_dir.path().join("bench.db"));
	let store = GeneratorStore::connect(&config).unwrap();
	store.initialize_schema();
	store
}

fn generators(count: usize) -> Vec<GeneratorRecord> {
	let owner = Uuid::new_v4();
	(0..count)
		.map(|i| {
			GeneratorRecord::new(owner, BlockLocation::new("world", i as i32, 64, 0), "stone", 5.0)
		})
		.collect()
}

// Benchmark saving each generator with its own connection checkout
fn bench_single_saves(c: &mut Criterion) {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let store = open_store(&temp_dir);
	let mut group = c.benchmark_group("single_saves");

	for batch_size in [10, 100].iter() {
		let records = generators(*batch_size);
		group.bench_with_input(BenchmarkId::new("generators", batch_size), &records, |b, records| {
			b.iter(|| {
				for record in records {
					store.try_save_generator(black_box(record)).unwrap();
				}
			})
		});
	}
	group.finish();
}

// Benchmark the bulk checkpoint path
fn bench_bulk_save(c: &mut Criterion) {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let store = open_store(&temp_dir);
	let mut group = c.benchmark_group("bulk_save");

	for batch_size in [10, 100, 1000].iter() {
		let records = generators(*batch_size);
		group.bench_with_input(BenchmarkId::new("generators", batch_size), &records, |b, records| {
			b.iter(|| store.try_save_generators(black_box(records)).unwrap())
		});
	}
	group.finish();
}

// Benchmark reading a full checkpoint back
fn bench_load_generators(c: &mut Criterion) {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let store = open_store(&temp_dir);
	store.try_save_generators(&generators(1000)).unwrap();

	c.bench_function("load_generators_1000", |b| {
		b.iter(|| black_box(store.load_generators().unwrap()))
	});
}

criterion_group!(benches, bench_single_saves, bench_bulk_save, bench_load_generators);
criterion_main!(benches);
