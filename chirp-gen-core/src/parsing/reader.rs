use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{error, warn};

use crate::error::{ChirpError, Result};
use crate::parsing::record::RawBlock;
use crate::parsing::worker_pool::WorkerPool;

const TIME_TAG: char = 'T';
const USER_TAG: char = 'U';
const TEXT_TAG: char = 'W';

/// How much of an offending line the scanner quotes when logging.
const LOG_PREVIEW_CHARS: usize = 40;

/// Extracts the next well-formed three-line block from a corpus stream.
///
/// A block is a `T` line, a `U` line and a `W` line in that order, each
/// tag followed by tab/space padding and a value, with no blank line in
/// between. Any deviation drops the buffered lines, logs the condition
/// and resumes scanning from the next line; the corpus is known to be
/// noisy and a malformed block must never end the scan.
///
/// Returns `Ok(None)` at a clean end of stream. Only an I/O failure on
/// the underlying reader is an error.
pub fn read_block<R: BufRead>(reader: &mut R) -> Result<Option<RawBlock>> {
	let mut time: Option<String> = None;
	let mut user: Option<String> = None;
	let mut line = String::new();

	loop {
		line.clear();
		if reader.read_line(&mut line)? == 0 {
			if time.is_some() {
				warn!("corpus ended inside a record, dropping partial block");
			}
			return Ok(None);
		}

		let content = line.trim_end_matches(['\r', '\n']);
		if content.trim().is_empty() {
			// Blank lines separate records while scanning but corrupt an
			// open one
			if time.is_some() {
				warn!("blank line inside a record, dropping partial block");
				time = None;
				user = None;
			}
			continue;
		}

		match (time.is_some(), user.is_some()) {
			(false, _) => match tag_value(content, TIME_TAG) {
				Some(value) => time = Some(value.to_owned()),
				None => warn!("expected a '{}' line, skipping: {}", TIME_TAG, preview(content)),
			},
			(true, false) => match tag_value(content, USER_TAG) {
				Some(value) => user = Some(value.to_owned()),
				None => {
					warn!("record missing its '{}' line, dropping partial block", USER_TAG);
					time = None;
				}
			},
			(true, true) => match tag_value(content, TEXT_TAG) {
				Some(value) => {
					// Both buffered lines exist in this state
					return Ok(Some(RawBlock {
						time: time.take().unwrap(),
						user: user.take().unwrap(),
						text: value.to_owned(),
					}));
				}
				None => {
					warn!("record missing its '{}' line, dropping partial block", TEXT_TAG);
					time = None;
					user = None;
				}
			},
		}
	}
}

/// Line remainder after `tag`, provided the tag is followed by padding.
fn tag_value(line: &str, tag: char) -> Option<&str> {
	let mut chars = line.chars();
	if chars.next()? != tag {
		return None;
	}
	let value = chars.as_str();
	value.starts_with([' ', '\t']).then_some(value)
}

fn preview(line: &str) -> String {
	if line.chars().count() <= LOG_PREVIEW_CHARS {
		return line.to_owned();
	}
	let shortened: String = line.chars().take(LOG_PREVIEW_CHARS).collect();
	format!("{}...", shortened)
}

/// Shared scan state, visible to the scan thread, the pool workers and
/// the polling caller.
struct ScanState {
	reading: AtomicBool,
	next_task: AtomicU64,
	outstanding: Mutex<HashSet<u64>>,
	failure: Mutex<Option<ChirpError>>,
}

/// Concurrent corpus reader: scans blocks on a dedicated thread and
/// dispatches record parsing across a bounded worker pool.
///
/// # Responsibilities
/// - Extract well-formed blocks from the corpus stream
/// - Run the caller's parse function on pool workers
/// - Fire the caller's completion callback exactly once per block
/// - Track outstanding tasks so completion is observable
///
/// # Notes
/// - The scan thread is the sole producer of tasks; worker callbacks are
///   the sole removers from the outstanding set.
/// - Completion order is not file order: callers must not assume FIFO
///   delivery of results.
/// - A failing parse task reaches its own callback as an `Err` and never
///   aborts the scan; an I/O failure on the stream aborts the scan and
///   is surfaced through `scan_error`.
pub struct CorpusReader<T> {
	path: PathBuf,
	pool: WorkerPool,
	parse: Arc<dyn Fn(RawBlock) -> Result<T> + Send + Sync>,
	callback: Arc<dyn Fn(Result<T>) + Send + Sync>,
	state: Arc<ScanState>,
}

impl<T: Send + 'static> CorpusReader<T> {
	/// Creates a reader with one pool worker per available CPU.
	pub fn new<P, F, C>(path: P, parse: F, callback: C) -> Self
	where
		P: AsRef<Path>,
		F: Fn(RawBlock) -> Result<T> + Send + Sync + 'static,
		C: Fn(Result<T>) + Send + Sync + 'static,
	{
		Self::with_workers(path, num_cpus::get(), parse, callback)
	}

	/// Creates a reader with an explicit worker-pool size.
	///
	/// The pool belongs to this reader and keeps its size for the
	/// reader's whole lifetime.
	pub fn with_workers<P, F, C>(path: P, workers: usize, parse: F, callback: C) -> Self
	where
		P: AsRef<Path>,
		F: Fn(RawBlock) -> Result<T> + Send + Sync + 'static,
		C: Fn(Result<T>) + Send + Sync + 'static,
	{
		Self {
			path: path.as_ref().to_owned(),
			pool: WorkerPool::new(workers),
			parse: Arc::new(parse),
			callback: Arc::new(callback),
			state: Arc::new(ScanState {
				reading: AtomicBool::new(false),
				next_task: AtomicU64::new(0),
				outstanding: Mutex::new(HashSet::new()),
				failure: Mutex::new(None),
			}),
		}
	}

	/// Starts the asynchronous bulk read.
	///
	/// Opens the corpus file (open failures return synchronously), then
	/// scans it on a dedicated thread. Every extracted block becomes a
	/// task on the worker pool: the parse function turns the raw block
	/// into the caller's result type and the completion callback receives
	/// that result or the task's failure. Submission applies the pool's
	/// backpressure when the queue is full.
	pub fn read(&self) -> Result<()> {
		let file = File::open(&self.path)?;

		// Raise the flag before the thread exists so a caller polling
		// right after read() cannot see a finished reader early
		self.state.reading.store(true, Ordering::SeqCst);

		let parse = Arc::clone(&self.parse);
		let callback = Arc::clone(&self.callback);
		let state = Arc::clone(&self.state);
		let pool = self.pool.handle();

		thread::spawn(move || {
			let mut reader = BufReader::new(file);
			loop {
				match read_block(&mut reader) {
					Ok(Some(block)) => {
						let id = state.next_task.fetch_add(1, Ordering::Relaxed);
						state
							.outstanding
							.lock()
							.expect("outstanding set lock poisoned")
							.insert(id);

						let parse = Arc::clone(&parse);
						let callback = Arc::clone(&callback);
						let state = Arc::clone(&state);
						pool.execute(Box::new(move || {
							callback(parse(block));
							state
								.outstanding
								.lock()
								.expect("outstanding set lock poisoned")
								.remove(&id);
						}));
					}
					Ok(None) => break,
					Err(e) => {
						error!("corpus scan aborted: {}", e);
						*state.failure.lock().expect("failure slot lock poisoned") = Some(e);
						break;
					}
				}
			}
			state.reading.store(false, Ordering::SeqCst);
		});

		Ok(())
	}

	/// True once the stream is fully scanned and every submitted task has
	/// completed. Intended for polling; results keep arriving through the
	/// completion callback until this flips.
	pub fn is_finished(&self) -> bool {
		!self.state.reading.load(Ordering::SeqCst)
			&& self
				.state
				.outstanding
				.lock()
				.expect("outstanding set lock poisoned")
				.is_empty()
	}

	/// Takes the I/O failure that aborted the scan, if any.
	///
	/// The scan thread cannot return its error, so a mid-scan failure is
	/// parked here after the "still reading" flag clears.
	pub fn scan_error(&self) -> Option<ChirpError> {
		self.state.failure.lock().expect("failure slot lock poisoned").take()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	const SAMPLE: &str = "\
T\t2009-09-30 23:55:53\n\
U\thttp://twitter.com/user1\n\
W\tI'm starting to feel really sick.\n\
\n\
T\t2009-09-30 23:56:10\n\
U\thttp://twitter.com/user2\n\
W\tsoooo i got sum advice\n";

	#[test]
	fn reads_two_blocks_in_file_order() {
		let mut reader = Cursor::new(SAMPLE);

		let first = read_block(&mut reader).unwrap().unwrap();
		assert_eq!(first.time, "\t2009-09-30 23:55:53");
		assert_eq!(first.user, "\thttp://twitter.com/user1");
		assert_eq!(first.text, "\tI'm starting to feel really sick.");

		let second = read_block(&mut reader).unwrap().unwrap();
		assert_eq!(second.user, "\thttp://twitter.com/user2");

		assert!(read_block(&mut reader).unwrap().is_none());
	}

	#[test]
	fn empty_stream_yields_none() {
		let mut reader = Cursor::new("");
		assert!(read_block(&mut reader).unwrap().is_none());
	}

	#[test]
	fn blank_only_stream_yields_none() {
		let mut reader = Cursor::new("\n\n   \n");
		assert!(read_block(&mut reader).unwrap().is_none());
	}

	#[test]
	fn block_missing_its_user_line_is_skipped() {
		let broken = "\
T\t2009-09-30 23:55:53\n\
W\ttext without a user line\n\
T\t2009-09-30 23:55:53\n\
U\thttp://twitter.com/user7\n\
W\tI'm writing my first message!!\n";
		let mut reader = Cursor::new(broken);

		let block = read_block(&mut reader).unwrap().unwrap();
		assert_eq!(block.user, "\thttp://twitter.com/user7");
		assert!(read_block(&mut reader).unwrap().is_none());
	}

	#[test]
	fn blank_line_inside_a_record_drops_it() {
		let broken = "\
T\t2009-09-30 23:55:53\n\
U\thttp://twitter.com/user1\n\
\n\
W\torphaned text line\n\
T\t2009-09-30 23:55:53\n\
U\thttp://twitter.com/user2\n\
W\tsurvivor\n";
		let mut reader = Cursor::new(broken);

		let block = read_block(&mut reader).unwrap().unwrap();
		assert_eq!(block.text, "\tsurvivor");
	}

	#[test]
	fn untagged_noise_between_records_is_skipped() {
		let noisy = "\
total crap line\n\
Whatever this is, it is not a W line\n\
T\t2009-09-30 23:55:53\n\
U\thttp://twitter.com/user1\n\
W\tstill parsed\n";
		let mut reader = Cursor::new(noisy);

		let block = read_block(&mut reader).unwrap().unwrap();
		assert_eq!(block.text, "\tstill parsed");
	}

	#[test]
	fn eof_inside_a_record_is_clean() {
		let truncated = "T\t2009-09-30 23:55:53\nU\thttp://twitter.com/user1\n";
		let mut reader = Cursor::new(truncated);
		assert!(read_block(&mut reader).unwrap().is_none());
	}

	#[test]
	fn tag_needs_padding_after_it() {
		// A prose line starting with the tag letter is not a tagged line
		assert!(tag_value("Whatever", TEXT_TAG).is_none());
		assert!(tag_value("W", TEXT_TAG).is_none());
		assert_eq!(tag_value("W text", TEXT_TAG), Some(" text"));
		assert_eq!(tag_value("W\ttext", TEXT_TAG), Some("\ttext"));
	}
}
