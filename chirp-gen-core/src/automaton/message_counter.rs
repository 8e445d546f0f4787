use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-author message tally.
///
/// Simple accumulation structure; the generation side turns it into a
/// weighted author distribution.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageCounter {
	counts: HashMap<String, u64>,
	total: u64,
}

impl MessageCounter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts one message for the given author.
	pub fn record(&mut self, author: &str) {
		*self.counts.entry(author.to_owned()).or_insert(0) += 1;
		self.total += 1;
	}

	/// Messages counted for one author.
	pub fn count_for(&self, author: &str) -> u64 {
		self.counts.get(author).copied().unwrap_or(0)
	}

	/// Messages counted overall.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Iterates over `(author, count)` pairs.
	pub fn authors(&self) -> impl Iterator<Item = (&str, u64)> {
		self.counts.iter().map(|(author, count)| (author.as_str(), *count))
	}
}
