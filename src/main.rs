use anyhow::Context;
use clap::{Parser, Subcommand};
use nextgens_store::{BlockLocation, GeneratorRecord, GeneratorStore, StorageConfig};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "nextgens-store")]
#[command(about = "Inspect and maintain the NextGens generator database")]
struct Cli {
	/// JSON file with the storage section of the plugin config
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Enable verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Create the generator and user tables if they are missing
	Init,

	/// Print every stored generator as JSON
	List,

	/// Bulk-save generators from a JSON array of records
	Import { file: PathBuf },

	/// Delete the generator at a `world,x,y,z` location
	Delete { location: String },
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt().with_max_level(level).init();

	let config = match &cli.config {
		Some(path) => StorageConfig::from_json_file(path)
			.with_context(|| format!("failed to load config from {}", path.display()))?,
		None => StorageConfig::default(),
	};

	let store = GeneratorStore::connect(&config).context("failed to open the database")?;
	store.initialize_schema();

	let outcome = run(&store, cli.command);
	store.close();
	outcome
}

fn run(store: &GeneratorStore, command: Command) -> anyhow::Result<()> {
	match command {
		Command::Init => {
			info!("{} generators stored", store.count_generators()?);
		}
		Command::List => {
			let generators = store.load_generators()?;
			println!("{}", serde_json::to_string_pretty(&generators)?);
		}
		Command::Import { file } => {
			let raw = std::fs::read_to_string(&file)
				.with_context(|| format!("failed to read {}", file.display()))?;
			let records: Vec<GeneratorRecord> = serde_json::from_str(&raw)?;
			let report = store.try_save_generators(&records)?;
			info!("Imported {} generators, skipped {}", report.saved, report.skipped);
		}
		Command::Delete { location } => {
			let location = BlockLocation::parse(&location)?;
			let removed = store.try_delete_generator_at(&location)?;
			info!("Removed {} generator(s) at {}", removed, location);
		}
	}
	Ok(())
}
