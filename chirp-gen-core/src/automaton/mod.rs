//! Learning and generation over corpus records.
//!
//! The learning side folds parsed records into a word transition matrix
//! plus small accumulators; the generation side walks the learned model
//! to emit synthetic records. Both sides meet in the snapshot, the
//! serialized form a run leaves behind.

/// First-order Markov model over word pairs.
///
/// Handles frequency accumulation, conditional chances, pruning and
/// aggregate statistics.
pub mod word_matrix;

/// Fixed 24x60 time-of-day accumulator.
pub mod time_histogram;

/// Per-author message tally.
pub mod message_counter;

/// Serialized bundle of learned state.
pub mod snapshot;

/// Learning driver feeding records into the model. Single writer of the
/// matrix and accumulators.
pub mod trainer;

/// Generation driver sampling synthetic records from a learned model.
pub mod word_sampler;
