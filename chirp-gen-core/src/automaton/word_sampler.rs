use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::automaton::message_counter::MessageCounter;
use crate::automaton::snapshot::ModelSnapshot;
use crate::automaton::time_histogram::TimeHistogram;
use crate::automaton::word_matrix::{END_TOKEN, START_TOKEN, TransitionMatrix};
use crate::error::Result;
use crate::parsing::record::{Record, Timestamp};
use crate::statistics::distribution::EventDistribution;

/// Hard ceiling on words per generated message.
///
/// A learned model can contain cycles; the ceiling bounds a walk that
/// never draws the end sentinel.
const MAX_MESSAGE_WORDS: usize = 64;

/// Calendar date stamped onto generated records.
///
/// Only the time of day is learned, so the date is a fixed anchor
/// callers can move with `with_base_date`.
const DEFAULT_BASE_DATE: (u16, u8, u8) = (2009, 9, 30);

/// Generation driver: walks a learned model and emits synthetic records.
///
/// Built once from finished model state — per-predecessor word
/// distributions, a time-of-day distribution and an author distribution,
/// all ready to sample. Construction is the only write; sampling reads
/// the distributions and touches nothing but the internal random source.
///
/// # Notes
/// - A draw landing in the unassigned remainder of a truncated
///   (incomplete) distribution intentionally yields no word and simply
///   ends the message.
pub struct MessageSampler {
	transitions: HashMap<String, EventDistribution<String>>,
	times: EventDistribution<(u8, u8)>,
	authors: EventDistribution<String>,
	base_date: (u16, u8, u8),
	rng: StdRng,
}

impl MessageSampler {
	/// Builds sampling distributions from learned model state.
	///
	/// Every predecessor's successor chances become one inverse-CDF
	/// distribution; rows that were pruned to zero-chance edges only are
	/// skipped. Time-of-day and author weights are each normalized by
	/// their own totals.
	///
	/// # Errors
	/// Propagates distribution build failures; a consistent matrix (as
	/// produced by the trainer) never triggers them.
	pub fn from_snapshot(snapshot: &ModelSnapshot) -> Result<Self> {
		Ok(Self {
			transitions: Self::transition_distributions(&snapshot.matrix)?,
			times: Self::time_distribution(&snapshot.times)?,
			authors: Self::author_distribution(&snapshot.messages)?,
			base_date: DEFAULT_BASE_DATE,
			rng: StdRng::from_rng(&mut rand::rng()),
		})
	}

	/// Moves the calendar date stamped onto generated records.
	pub fn with_base_date(mut self, year: u16, month: u8, day: u8) -> Self {
		self.base_date = (year, month, day);
		self
	}

	/// Replaces the random source deterministically for reproducible
	/// generation runs.
	pub fn reseed(&mut self, seed: u64) {
		self.rng = StdRng::seed_from_u64(seed);
	}

	/// The ready-to-sample successor distribution of one predecessor
	/// word, if that word was ever learned as a predecessor.
	pub fn distribution_for(&self, predecessor: &str) -> Option<&EventDistribution<String>> {
		self.transitions.get(predecessor)
	}

	/// Samples one synthetic message text.
	///
	/// Walks word to word from the start sentinel until the end sentinel
	/// is drawn, a draw lands in an unassigned remainder, a word has no
	/// learned successors, or the length ceiling is reached. Returns
	/// `None` when the model yields no opening word.
	pub fn sample_message(&mut self) -> Option<String> {
		let Self { transitions, rng, .. } = self;

		let mut words: Vec<String> = Vec::new();
		let mut predecessor = START_TOKEN.to_owned();

		while words.len() < MAX_MESSAGE_WORDS {
			let Some(distribution) = transitions.get(&predecessor) else {
				break;
			};
			match distribution.sample_with(rng) {
				Some(word) if word != END_TOKEN => {
					words.push(word.clone());
					predecessor = word.clone();
				}
				// End sentinel, or a draw past the aggregated weight
				_ => break,
			}
		}

		if words.is_empty() { None } else { Some(words.join(" ")) }
	}

	/// Samples one complete synthetic record: message text, a learned
	/// author and a timestamp with a learned time of day.
	///
	/// Returns `None` once the model cannot produce a message or never
	/// saw an author.
	pub fn sample_record(&mut self) -> Option<Record> {
		let text = self.sample_message()?;
		let author = self.authors.sample_with(&mut self.rng)?.clone();

		let (hour, minute) = self.times.sample_with(&mut self.rng).copied().unwrap_or((0, 0));
		let (year, month, day) = self.base_date;
		let time = Timestamp { year, month, day, hour, minute, second: 0 };

		Some(Record { time, author, text })
	}

	fn transition_distributions(
		matrix: &TransitionMatrix,
	) -> Result<HashMap<String, EventDistribution<String>>> {
		let mut transitions = HashMap::new();
		for predecessor in matrix.predecessors() {
			// Insert in sorted order: cumulative intervals then depend
			// only on the model content, and a reseeded sampler walks
			// identically across instances and runs
			let mut successors: Vec<(String, f64)> = matrix.mappings(predecessor).into_iter().collect();
			successors.sort_by(|left, right| left.0.cmp(&right.0));

			let mut distribution = EventDistribution::new();
			for (successor, chance) in successors {
				if chance > 0.0 {
					distribution.add_event(successor, chance)?;
				}
			}
			if !distribution.is_empty() {
				transitions.insert(predecessor.to_owned(), distribution);
			}
		}
		Ok(transitions)
	}

	fn time_distribution(times: &TimeHistogram) -> Result<EventDistribution<(u8, u8)>> {
		let mut distribution = EventDistribution::new();
		let total = times.total();
		if total == 0 {
			return Ok(distribution);
		}
		for ((hour, minute), count) in times.cells() {
			if count > 0 {
				distribution.add_event((hour, minute), count as f64 / total as f64)?;
			}
		}
		Ok(distribution)
	}

	fn author_distribution(messages: &MessageCounter) -> Result<EventDistribution<String>> {
		let mut distribution = EventDistribution::new();
		let total = messages.total();
		if total == 0 {
			return Ok(distribution);
		}

		// Sorted for the same reproducibility reason as the transitions
		let mut authors: Vec<(&str, u64)> = messages.authors().collect();
		authors.sort_by(|left, right| left.0.cmp(right.0));
		for (author, count) in authors {
			distribution.add_event(author.to_owned(), count as f64 / total as f64)?;
		}
		Ok(distribution)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::automaton::trainer::CorpusTrainer;

	fn single_chain_snapshot() -> ModelSnapshot {
		let mut trainer = CorpusTrainer::new();
		trainer.learn_record(&Record {
			time: Timestamp { year: 2009, month: 9, day: 30, hour: 23, minute: 55, second: 53 },
			author: "http://twitter.com/user1".to_owned(),
			text: "hello brave new world".to_owned(),
		});
		trainer.into_snapshot()
	}

	#[test]
	fn deterministic_chain_reproduces_the_message() {
		// Every transition has chance 1.0, so any random source must
		// walk the one learned path
		let mut sampler = MessageSampler::from_snapshot(&single_chain_snapshot()).unwrap();
		for seed in 0..5 {
			sampler.reseed(seed);
			assert_eq!(sampler.sample_message().as_deref(), Some("hello brave new world"));
		}
	}

	#[test]
	fn sampled_record_carries_learned_author_and_time() {
		let mut sampler = MessageSampler::from_snapshot(&single_chain_snapshot()).unwrap();
		let record = sampler.sample_record().unwrap();

		assert_eq!(record.author, "http://twitter.com/user1");
		assert_eq!((record.time.hour, record.time.minute), (23, 55));
		assert_eq!((record.time.year, record.time.month, record.time.day), DEFAULT_BASE_DATE);
	}

	#[test]
	fn empty_model_yields_nothing() {
		let mut sampler = MessageSampler::from_snapshot(&ModelSnapshot::default()).unwrap();
		assert!(sampler.sample_message().is_none());
		assert!(sampler.sample_record().is_none());
	}

	#[test]
	fn reseeding_reproduces_generation() {
		let mut trainer = CorpusTrainer::new();
		for text in ["a b", "a c", "b a", "c c a"] {
			trainer.learn_record(&Record {
				time: Timestamp { year: 2009, month: 9, day: 30, hour: 1, minute: 2, second: 3 },
				author: "http://twitter.com/user1".to_owned(),
				text: text.to_owned(),
			});
		}
		let snapshot = trainer.into_snapshot();

		let mut first = MessageSampler::from_snapshot(&snapshot).unwrap();
		let mut second = MessageSampler::from_snapshot(&snapshot).unwrap();
		first.reseed(99);
		second.reseed(99);

		for _ in 0..20 {
			assert_eq!(first.sample_message(), second.sample_message());
		}
	}

	#[test]
	fn generation_walks_end_on_truncated_rows() {
		let mut trainer = CorpusTrainer::new();
		trainer.learn_words(["one", "two", "three"]);
		let mut snapshot = trainer.into_snapshot();
		// Prune hard enough that nothing survives: the walk must end
		// cleanly instead of erroring
		snapshot.matrix.truncate_to(1.5);

		let mut sampler = MessageSampler::from_snapshot(&snapshot).unwrap();
		assert!(sampler.sample_message().is_none());
	}

	#[test]
	fn exposes_per_predecessor_distributions() {
		let sampler = MessageSampler::from_snapshot(&single_chain_snapshot()).unwrap();

		let from_hello = sampler.distribution_for("hello").unwrap();
		assert_eq!(from_hello.len(), 1);
		assert_eq!(from_hello.sample_at(0.5), Some(&"brave".to_owned()));
		assert!(sampler.distribution_for("unheard").is_none());
	}
}
