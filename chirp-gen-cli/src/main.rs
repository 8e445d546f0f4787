use std::env;

use log::{error, info};

use chirp_gen_core::automaton::snapshot::ModelSnapshot;
use chirp_gen_core::automaton::trainer::CorpusTrainer;
use chirp_gen_core::automaton::word_sampler::MessageSampler;
use chirp_gen_core::io::{display_name, list_models, model_path_for, resolve_folder};

/// Command dispatch for the chirp-gen tools.
///
/// Deliberately plain: a command word followed by positional arguments,
/// so the interesting work stays in the core crate.
fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	let args: Vec<String> = env::args().skip(1).collect();
	if args.is_empty() {
		error!("No arguments given. To get an overview please use the argument --help.");
		return Ok(());
	}

	match args[0].as_str() {
		"--help" => print_help(),
		"learn" => learn(&args[1..])?,
		"generate" => generate(&args[1..])?,
		"models" => models(&args[1..])?,
		other => {
			error!("Command {:?} not recognized. To get an overview please use the argument --help.", other);
		}
	}

	Ok(())
}

fn print_help() {
	println!("Usage: <command> [args]");
	println!("Commands:");
	println!("  learn <corpus> [threshold]      learn a model from a twitter7 corpus file,");
	println!("                                  optionally pruning chances below threshold,");
	println!("                                  and write it next to the corpus as .bin");
	println!("  generate <model> [count] [seed] sample synthetic records from a learned model");
	println!("  models <folder>                 list model files in a folder");
}

/// Learns a model from a corpus file and writes the snapshot beside it.
fn learn(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
	let corpus = args.first().ok_or("learn needs a corpus file")?;

	let mut trainer = CorpusTrainer::new();
	let report = trainer.train_file(corpus)?;
	info!(
		"learned {} records from '{}', skipped {}",
		report.records,
		display_name(corpus)?,
		report.failures
	);

	if let Some(threshold) = args.get(1) {
		let threshold: f64 = threshold.parse()?;
		trainer.truncate(threshold);
		info!("model truncated to chance threshold {}", threshold);
	}

	let output = model_path_for(corpus)?;
	trainer.into_snapshot().save(&output)?;
	info!("model written to {}", output.display());

	Ok(())
}

/// Samples synthetic records from a saved model and prints them in
/// corpus form.
fn generate(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
	let model = args.first().ok_or("generate needs a model file")?;
	let count: usize = match args.get(1) {
		Some(raw) => raw.parse()?,
		None => 10,
	};

	let snapshot = ModelSnapshot::load(model)?;
	let mut sampler = MessageSampler::from_snapshot(&snapshot)?;
	if let Some(seed) = args.get(2) {
		sampler.reseed(seed.parse()?);
	}

	for produced in 0..count {
		match sampler.sample_record() {
			Some(record) => print!("{}", record),
			None => {
				error!("model ran dry after {} records", produced);
				break;
			}
		}
	}

	Ok(())
}

/// Lists model files in a folder.
fn models(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
	let folder = match args.first() {
		Some(folder) => resolve_folder(folder),
		None => resolve_folder("."),
	};

	for model in list_models(&folder)? {
		println!("{}", model);
	}

	Ok(())
}
