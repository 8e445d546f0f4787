use serde::{Deserialize, Serialize};

use crate::parsing::record::Timestamp;

/// Hours per day in the histogram grid.
pub const HOURS: usize = 24;

/// Minutes per hour in the histogram grid.
pub const MINUTES: usize = 60;

/// Fixed 24x60 count matrix over message time of day.
///
/// `at(h, m)` messages were sent between `h:m` o'clock (inclusive) and
/// `h:(m+1)` o'clock (exclusive). Stored flat so the serialized form is
/// independent of in-memory layout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TimeHistogram {
	counts: Vec<u64>,
}

impl TimeHistogram {
	/// Creates an all-zero histogram.
	pub fn new() -> Self {
		Self { counts: vec![0; HOURS * MINUTES] }
	}

	/// Adds `count` messages at the timestamp's hour and minute.
	pub fn record(&mut self, time: &Timestamp, count: u64) {
		self.counts[Self::index(time.hour, time.minute)] += count;
	}

	/// Count of messages at the given minute of day.
	pub fn at(&self, hour: u8, minute: u8) -> u64 {
		self.counts[Self::index(hour, minute)]
	}

	/// Total count over the whole day.
	pub fn total(&self) -> u64 {
		self.counts.iter().sum()
	}

	/// Iterates over all `((hour, minute), count)` cells.
	pub fn cells(&self) -> impl Iterator<Item = ((u8, u8), u64)> + '_ {
		self.counts.iter().enumerate().map(|(index, count)| {
			(((index / MINUTES) as u8, (index % MINUTES) as u8), *count)
		})
	}

	fn index(hour: u8, minute: u8) -> usize {
		// Timestamp parsing bounds hour and minute, so this stays in range
		hour as usize * MINUTES + minute as usize
	}
}

impl Default for TimeHistogram {
	fn default() -> Self {
		Self::new()
	}
}
