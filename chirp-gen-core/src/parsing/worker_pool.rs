use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

/// Unit of work executed on a pool worker.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool of worker threads fed through a bounded queue.
///
/// The pool is owned by whoever constructs it and sized once; there is
/// no global executor. Submission through a `PoolHandle` blocks when the
/// queue is full, which is the intended backpressure under load. Once
/// submitted, a job runs to completion; there is no cancellation.
///
/// Dropping the pool closes the queue and joins every worker after the
/// jobs already queued have run.
pub(crate) struct WorkerPool {
	sender: Option<mpsc::SyncSender<Job>>,
	workers: Vec<thread::JoinHandle<()>>,
}

/// Cloneable submission endpoint, detachable from the pool's lifetime
/// so a producer thread can keep submitting while the owner holds the
/// pool itself.
#[derive(Clone)]
pub(crate) struct PoolHandle {
	sender: mpsc::SyncSender<Job>,
}

impl WorkerPool {
	pub(crate) fn new(size: usize) -> Self {
		let size = size.max(1);
		let (sender, receiver) = mpsc::sync_channel::<Job>(size * 2);
		let receiver = Arc::new(Mutex::new(receiver));

		let workers = (0..size)
			.map(|_| {
				let receiver = Arc::clone(&receiver);
				thread::spawn(move || {
					loop {
						// Hold the lock only for the dequeue, not the job
						let job = match receiver.lock() {
							Ok(receiver) => receiver.recv(),
							Err(_) => break,
						};
						match job {
							Ok(job) => job(),
							Err(_) => break,
						}
					}
				})
			})
			.collect();

		Self { sender: Some(sender), workers }
	}

	pub(crate) fn handle(&self) -> PoolHandle {
		// The sender is only None after drop has begun
		PoolHandle { sender: self.sender.clone().unwrap() }
	}
}

impl PoolHandle {
	/// Submits a job, blocking while the queue is full.
	pub(crate) fn execute(&self, job: Job) {
		// Send only fails once every worker is gone, i.e. during teardown
		let _ = self.sender.send(job);
	}
}

impl Drop for WorkerPool {
	fn drop(&mut self) {
		drop(self.sender.take());
		for worker in self.workers.drain(..) {
			let _ = worker.join();
		}
	}
}
