use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use log::warn;

use crate::automaton::message_counter::MessageCounter;
use crate::automaton::snapshot::ModelSnapshot;
use crate::automaton::time_histogram::TimeHistogram;
use crate::automaton::word_matrix::{END_TOKEN, START_TOKEN, TransitionMatrix};
use crate::error::Result;
use crate::parsing::reader::CorpusReader;
use crate::parsing::record::Record;

/// How long the training loop waits for a result before re-checking
/// whether the reader has finished.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one training run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainReport {
	/// Records learned into the model.
	pub records: u64,
	/// Blocks whose parse task failed; logged and skipped.
	pub failures: u64,
}

/// Learning driver: turns parsed records into model state.
///
/// Owns the transition matrix and the accumulators, which makes it the
/// single writer those structures require. The concurrent reader's
/// callbacks funnel every result through a channel drained here, so
/// `alter_frequency` is only ever called from the training thread.
#[derive(Debug, Default)]
pub struct CorpusTrainer {
	matrix: TransitionMatrix,
	times: TimeHistogram,
	messages: MessageCounter,
}

impl CorpusTrainer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resumes training on top of a previously saved snapshot.
	pub fn from_snapshot(snapshot: ModelSnapshot) -> Self {
		Self {
			matrix: snapshot.matrix,
			times: snapshot.times,
			messages: snapshot.messages,
		}
	}

	pub fn matrix(&self) -> &TransitionMatrix {
		&self.matrix
	}

	pub fn times(&self) -> &TimeHistogram {
		&self.times
	}

	pub fn messages(&self) -> &MessageCounter {
		&self.messages
	}

	/// Hands the learned state over for persistence or generation.
	pub fn into_snapshot(self) -> ModelSnapshot {
		ModelSnapshot {
			matrix: self.matrix,
			times: self.times,
			messages: self.messages,
		}
	}

	/// Learns one record: word transitions, time of day and author.
	///
	/// This is the learning boundary — callers feed records (or
	/// equivalently `(timestamp, word-sequence)` pairs via `learn_words`)
	/// and never touch the model structures directly.
	pub fn learn_record(&mut self, record: &Record) {
		self.messages.record(&record.author);
		self.times.record(&record.time, 1);
		self.learn_words(record.words());
	}

	/// Learns the successive word pairs of one message.
	///
	/// The first word is recorded as a successor of the start sentinel
	/// and the last word gets the end sentinel as its successor, so both
	/// message boundaries become ordinary sampled transitions. Messages
	/// without words leave the matrix untouched.
	pub fn learn_words<'a, I>(&mut self, words: I)
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut predecessor = START_TOKEN;
		for word in words {
			if word.is_empty() {
				continue;
			}
			self.matrix.alter_frequency(predecessor, word, 1);
			predecessor = word;
		}
		if predecessor != START_TOKEN {
			self.matrix.alter_frequency(predecessor, END_TOKEN, 1);
		}
	}

	/// Truncates the learned matrix, pruning edges below `threshold`.
	pub fn truncate(&mut self, threshold: f64) {
		self.matrix.truncate_to(threshold);
	}

	/// Trains on a whole corpus file using the default worker-pool size.
	///
	/// Drives a `CorpusReader` over the file: blocks parse concurrently,
	/// results flow back through a channel and are learned here in
	/// arrival order (which is not file order; transition counts do not
	/// care). Parse failures are logged, counted and skipped. An I/O
	/// failure that aborted the scan is re-raised once the reader winds
	/// down.
	pub fn train_file<P: AsRef<Path>>(&mut self, path: P) -> Result<TrainReport> {
		let (sender, receiver) = mpsc::channel::<Result<Record>>();

		let reader = CorpusReader::new(
			path,
			|block| Record::from_block(&block),
			move |outcome| {
				// The trainer may stop listening after a scan abort; a
				// closed channel just drops the result
				let _ = sender.send(outcome);
			},
		);
		reader.read()?;

		let mut report = TrainReport::default();
		loop {
			match receiver.recv_timeout(POLL_INTERVAL) {
				Ok(outcome) => self.consume(outcome, &mut report),
				Err(mpsc::RecvTimeoutError::Timeout) => {
					if reader.is_finished() {
						// Every callback has fired; drain what is queued
						while let Ok(outcome) = receiver.try_recv() {
							self.consume(outcome, &mut report);
						}
						break;
					}
				}
				Err(mpsc::RecvTimeoutError::Disconnected) => break,
			}
		}

		match reader.scan_error() {
			Some(error) => Err(error),
			None => Ok(report),
		}
	}

	fn consume(&mut self, outcome: Result<Record>, report: &mut TrainReport) {
		match outcome {
			Ok(record) => {
				self.learn_record(&record);
				report.records += 1;
			}
			Err(e) => {
				warn!("skipping unparsable record: {}", e);
				report.failures += 1;
			}
		}
	}
}
