use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::automaton::message_counter::MessageCounter;
use crate::automaton::time_histogram::TimeHistogram;
use crate::automaton::word_matrix::TransitionMatrix;
use crate::error::{ChirpError, Result};

/// Serializable bundle of everything a learning run produces.
///
/// Written as compact postcard bytes. Loading a snapshot reconstructs
/// the same logical content regardless of in-memory layout, so chances,
/// mappings and aggregate statistics survive process restarts exactly.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ModelSnapshot {
	pub matrix: TransitionMatrix,
	pub times: TimeHistogram,
	pub messages: MessageCounter,
}

impl ModelSnapshot {
	/// Writes the snapshot to `path` atomically.
	///
	/// The bytes land in a temp file beside the target first, so a crash
	/// mid-write never leaves a truncated snapshot behind.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = postcard::to_stdvec(self)?;

		let parent = path.parent().unwrap_or_else(|| Path::new("."));
		let mut staged = NamedTempFile::new_in(parent)?;
		staged.write_all(&bytes)?;
		staged.persist(path).map_err(|e| ChirpError::Io(e.error))?;
		Ok(())
	}

	/// Reads a snapshot previously written by `save`.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}
}
