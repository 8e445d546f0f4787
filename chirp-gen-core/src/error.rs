//! Error types shared across the crate.

use thiserror::Error;

/// Crate-wide error type.
///
/// Model mutations (`InvalidWeight`, `ProbabilityOverflow`) are rejected
/// synchronously and leave the mutated structure unchanged. Query-time
/// conditions (`UnknownPredecessor`) signal absence, not corruption.
/// Scanner-level malformed input is recovered locally and never surfaces
/// here; `MalformedRecord` is reserved for record-level parse tasks.
#[derive(Debug, Error)]
pub enum ChirpError {
	/// An event weight must be a positive, finite probability.
	#[error("event weight must be positive")]
	InvalidWeight,

	/// Adding the event would push the aggregated weight past `1 + tolerance`.
	#[error("aggregated chance {aggregated} exceeds 1 plus tolerance")]
	ProbabilityOverflow {
		/// The aggregated weight the rejected insertion would have reached.
		aggregated: f64,
	},

	/// The transition matrix holds no row for the queried predecessor.
	#[error("unknown predecessor word: {word:?}")]
	UnknownPredecessor {
		/// The predecessor that was queried.
		word: String,
	},

	/// A record-parse task could not turn its raw block into a record.
	#[error("malformed record: {message}")]
	MalformedRecord {
		/// Description of the offending content.
		message: String,
	},

	/// Unrecoverable failure on the underlying corpus stream.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// A model snapshot could not be encoded or decoded.
	#[error("snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),
}

/// Type alias for Results using `ChirpError`.
pub type Result<T> = std::result::Result<T, ChirpError>;
