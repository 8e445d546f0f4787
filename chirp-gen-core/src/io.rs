use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Extension used for serialized model snapshots.
const MODEL_EXTENSION: &str = "bin";

/// Derives the model file written beside a corpus: same directory, same
/// stem, `.bin` extension.
///
/// Example: `data/corpus.txt` → `data/corpus.bin`
pub fn model_path_for<P: AsRef<Path>>(corpus: P) -> io::Result<PathBuf> {
	let corpus = corpus.as_ref();
	let stem = corpus
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"))?;

	let mut model = PathBuf::from(corpus.parent().unwrap_or_else(|| Path::new(".")));
	model.push(stem);
	model.set_extension(MODEL_EXTENSION);
	Ok(model)
}

/// Base filename without extension, for naming models in log output.
pub fn display_name<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let stem = path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Resolves a folder argument.
///
/// `"."` and `"./"` mean the current working directory; anything else is
/// taken as-is (not canonicalized).
pub fn resolve_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the model files directly inside a folder, by name.
///
/// Subdirectories are not descended into.
pub fn list_models<P: AsRef<Path>>(folder: P) -> io::Result<Vec<String>> {
	let mut models = Vec::new();

	for entry in fs::read_dir(folder)? {
		let path = entry?.path();
		let is_model = path.is_file()
			&& path.extension() == Some(std::ffi::OsStr::new(MODEL_EXTENSION));
		if is_model {
			if let Some(name) = path.file_name() {
				models.push(name.to_string_lossy().to_string());
			}
		}
	}

	models.sort();
	Ok(models)
}
