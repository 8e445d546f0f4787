use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ChirpError, Result};

/// Sentinel word marking the start of a message.
///
/// Learned as the predecessor of every first word so the generation side
/// can sample an opening word like any other transition.
pub const START_TOKEN: &str = "<";

/// Sentinel word marking the end of a message.
///
/// Learned as the successor of every last word; drawing it (or drawing
/// nothing from an incomplete distribution) terminates a message.
pub const END_TOKEN: &str = ">";

/// Outgoing transitions of one predecessor word.
///
/// # Invariants
/// - `total` equals the sum of all successor counts
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct TransitionRow {
	total: u64,
	successors: HashMap<String, u64>,
}

/// Sparse, incrementally updatable first-order Markov model over word
/// pairs.
///
/// # Responsibilities
/// - Accumulate word-pair frequencies during learning
/// - Expose conditional chances and full successor mappings
/// - Prune low-chance edges and recompute totals
/// - Derive aggregate statistics over all stored chances
///
/// # Notes
/// - Not internally synchronized: writes go through a single owner, and
///   the matrix becomes effectively immutable once learning finishes.
/// - Serializes with serde; snapshots round-trip to identical chances,
///   mappings and aggregate statistics.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TransitionMatrix {
	rows: HashMap<String, TransitionRow>,
}

impl TransitionMatrix {
	/// Creates an empty matrix.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of predecessor words with at least one stored successor entry.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Iterates over all predecessor words.
	pub fn predecessors(&self) -> impl Iterator<Item = &str> {
		self.rows.keys().map(String::as_str)
	}

	/// Adds `delta` to the count of `(predecessor, successor)`, creating
	/// entries as needed, and keeps the predecessor total in step.
	///
	/// Learning only ever increments; negative deltas exist for manual
	/// corrections and saturate the edge count at zero.
	pub fn alter_frequency(&mut self, predecessor: &str, successor: &str, delta: i64) {
		let row = self.rows.entry(predecessor.to_owned()).or_default();
		let count = row.successors.entry(successor.to_owned()).or_insert(0);

		if delta >= 0 {
			*count += delta as u64;
			row.total += delta as u64;
		} else {
			let decrement = delta.unsigned_abs().min(*count);
			*count -= decrement;
			row.total -= decrement;
		}
	}

	/// Conditional chance of `successor` following `predecessor`.
	///
	/// A known predecessor with an unobserved successor is a plain 0.0;
	/// only a predecessor without any entries is an error, so callers can
	/// tell "never seen this word" from "never seen this pair".
	///
	/// # Errors
	/// `UnknownPredecessor` if the matrix holds no row for `predecessor`.
	pub fn chance(&self, predecessor: &str, successor: &str) -> Result<f64> {
		let row = self.rows.get(predecessor).ok_or_else(|| ChirpError::UnknownPredecessor {
			word: predecessor.to_owned(),
		})?;

		if row.total == 0 {
			return Ok(0.0);
		}
		Ok(row.successors.get(successor).copied().unwrap_or(0) as f64 / row.total as f64)
	}

	/// Full successor-to-chance mapping for a predecessor.
	///
	/// Unknown predecessors yield an empty map: iteration callers want
	/// "nothing to iterate", unlike the existence-checking `chance` query.
	pub fn mappings(&self, predecessor: &str) -> HashMap<String, f64> {
		match self.rows.get(predecessor) {
			None => HashMap::new(),
			Some(row) => row
				.successors
				.iter()
				.map(|(successor, count)| (successor.clone(), Self::row_chance(row, *count)))
				.collect(),
		}
	}

	/// Removes every successor edge whose chance is strictly below
	/// `threshold`, recomputes the affected totals from the remaining
	/// successors, and drops predecessors left without successors.
	///
	/// Chances are evaluated against the pre-truncation totals in a
	/// single pass.
	pub fn truncate_to(&mut self, threshold: f64) {
		self.rows.retain(|_, row| {
			let total = row.total;
			row.successors.retain(|_, count| {
				let chance = if total == 0 { 0.0 } else { *count as f64 / total as f64 };
				chance >= threshold
			});
			row.total = row.successors.values().sum();
			!row.successors.is_empty()
		});
	}

	/// Population mean over all stored conditional chances.
	///
	/// Recomputed on demand; 0.0 on an empty matrix.
	pub fn mean_chance(&self) -> f64 {
		let mut sum = 0.0;
		let mut count = 0usize;
		for chance in self.chances() {
			sum += chance;
			count += 1;
		}
		if count == 0 { 0.0 } else { sum / count as f64 }
	}

	/// Population standard deviation over all stored conditional chances.
	///
	/// Recomputed on demand; 0.0 on an empty matrix.
	pub fn chance_std_deviation(&self) -> f64 {
		let mean = self.mean_chance();
		let mut sum = 0.0;
		let mut count = 0usize;
		for chance in self.chances() {
			let deviation = chance - mean;
			sum += deviation * deviation;
			count += 1;
		}
		if count == 0 { 0.0 } else { (sum / count as f64).sqrt() }
	}

	/// Merges another matrix into this one by summing counts row-wise.
	///
	/// Intended for combining partial models learned separately.
	pub fn merge(&mut self, other: &Self) {
		for (predecessor, row) in &other.rows {
			let mine = self.rows.entry(predecessor.clone()).or_default();
			mine.total += row.total;
			for (successor, count) in &row.successors {
				*mine.successors.entry(successor.clone()).or_insert(0) += count;
			}
		}
	}

	fn row_chance(row: &TransitionRow, count: u64) -> f64 {
		if row.total == 0 { 0.0 } else { count as f64 / row.total as f64 }
	}

	fn chances(&self) -> impl Iterator<Item = f64> + '_ {
		self.rows.values().flat_map(|row| {
			row.successors.values().map(move |count| Self::row_chance(row, *count))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn two_edge_matrix() -> TransitionMatrix {
		let mut matrix = TransitionMatrix::new();
		matrix.alter_frequency("a", "a", 1);
		matrix.alter_frequency("a", "b", 1);
		matrix
	}

	fn assert_two_edge_matrix(matrix: &TransitionMatrix) {
		assert_eq!(matrix.chance("a", "a").unwrap(), 0.5);
		assert_eq!(matrix.chance("a", "b").unwrap(), 0.5);

		let mappings = matrix.mappings("a");
		assert_eq!(mappings.len(), 2);
		assert_eq!(mappings["a"], 0.5);
		assert_eq!(mappings["b"], 0.5);

		assert_eq!(matrix.mean_chance(), 0.5);
		assert_eq!(matrix.chance_std_deviation(), 0.0);
	}

	#[test]
	fn empty_matrix_query_is_an_error() {
		let matrix = TransitionMatrix::new();
		assert!(matches!(
			matrix.chance("a", "a"),
			Err(ChirpError::UnknownPredecessor { .. })
		));
	}

	#[test]
	fn chance_is_count_over_total() {
		let mut matrix = TransitionMatrix::new();
		matrix.alter_frequency("the", "quick", 3);
		matrix.alter_frequency("the", "lazy", 1);

		assert_eq!(matrix.chance("the", "quick").unwrap(), 0.75);
		assert_eq!(matrix.chance("the", "lazy").unwrap(), 0.25);
		// Known predecessor, unseen successor: plain zero, not an error
		assert_eq!(matrix.chance("the", "dog").unwrap(), 0.0);
	}

	#[test]
	fn mappings_of_unknown_predecessor_are_empty() {
		let matrix = two_edge_matrix();
		assert!(matrix.mappings("zebra").is_empty());
	}

	#[test]
	fn read_write() {
		let matrix = two_edge_matrix();
		assert_two_edge_matrix(&matrix);
	}

	#[test]
	fn negative_delta_saturates_at_zero() {
		let mut matrix = TransitionMatrix::new();
		matrix.alter_frequency("a", "b", 2);
		matrix.alter_frequency("a", "b", -5);

		assert_eq!(matrix.chance("a", "b").unwrap(), 0.0);
	}

	#[test]
	fn totals_stay_consistent_under_mixed_deltas() {
		let mut matrix = TransitionMatrix::new();
		matrix.alter_frequency("a", "b", 3);
		matrix.alter_frequency("a", "c", 1);
		matrix.alter_frequency("a", "b", -2);

		assert_eq!(matrix.chance("a", "b").unwrap(), 0.5);
		assert_eq!(matrix.chance("a", "c").unwrap(), 0.5);
	}

	#[test]
	fn truncate_to_one_empties_the_matrix() {
		let mut matrix = two_edge_matrix();
		matrix.truncate_to(1.0);
		assert!(matrix.is_empty());
		assert_eq!(matrix.predecessors().count(), 0);
	}

	#[test]
	fn truncate_to_zero_is_a_no_op() {
		let mut matrix = two_edge_matrix();
		matrix.truncate_to(0.0);
		assert_two_edge_matrix(&matrix);
	}

	#[test]
	fn truncation_recomputes_totals() {
		let mut matrix = TransitionMatrix::new();
		matrix.alter_frequency("a", "b", 9);
		matrix.alter_frequency("a", "c", 1);
		matrix.truncate_to(0.5);

		// Only a -> b survives and its chance renormalizes to 1.0
		assert_eq!(matrix.chance("a", "b").unwrap(), 1.0);
		assert!(matrix.mappings("a").len() == 1);
	}

	#[test]
	fn merge_sums_counts() {
		let mut left = two_edge_matrix();
		let right = two_edge_matrix();
		left.merge(&right);

		assert_eq!(left.chance("a", "a").unwrap(), 0.5);
		assert_eq!(left.chance("a", "b").unwrap(), 0.5);
	}

	#[test]
	fn snapshot_round_trip_preserves_everything() {
		let matrix = two_edge_matrix();
		let bytes = postcard::to_stdvec(&matrix).unwrap();
		let restored: TransitionMatrix = postcard::from_bytes(&bytes).unwrap();
		assert_two_edge_matrix(&restored);
	}
}
