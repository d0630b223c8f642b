use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{Level, event};

use crate::outcome::WorkerPanic;

use super::{Cancellable, FailureSink, FailureSlot, WorkerHandle};

/// A worker running as a tokio task, cancelled by aborting the task.
#[derive (Clone)]
pub struct TaskWorker
{
	inner: Arc <Inner>
}

struct Inner
{
	abort: AbortHandle,
	cancelled: AtomicBool,
	failures: Arc <FailureSlot>
}

impl TaskWorker
{
	pub fn spawn <F> (future: F) -> Self
	where F: Future <Output = ()> + Send + 'static
	{
		let handle = tokio::task::spawn (future);
		let failures = Arc::new (FailureSlot::new ());

		let inner = Inner
		{
			abort: handle . abort_handle (),
			cancelled: AtomicBool::new (false),
			failures: failures . clone ()
		};

		monitor (handle, failures);

		Self {inner: Arc::new (inner)}
	}

	pub fn is_finished (&self) -> bool
	{
		self . inner . abort . is_finished ()
	}
}

// Watches a spawned worker task and turns a panic into the worker's one
// reportable failure. Aborted tasks are not failures.
pub (super) fn monitor (handle: JoinHandle <()>, failures: Arc <FailureSlot>)
{
	tokio::task::spawn
	(
		async move
		{
			let Err (join_error) = handle . await
			else
			{
				return;
			};

			match join_error . try_into_panic ()
			{
				Ok (payload) =>
				{
					let panic = WorkerPanic::from_payload (&*payload);

					event! (Level::ERROR, error = %panic, "worker task panicked");

					failures . capture (Arc::new (panic));
				}
				Err (_) => event! (Level::DEBUG, "worker task was aborted")
			}
		}
	);
}

impl Cancellable for TaskWorker
{
	fn cancel (&self) -> bool
	{
		if self . inner . cancelled . swap (true, Ordering::SeqCst)
		{
			return false;
		}

		self . inner . abort . abort ();

		true
	}

	fn is_cancelled (&self) -> bool
	{
		self . inner . cancelled . load (Ordering::SeqCst)
	}
}

impl WorkerHandle for TaskWorker
{
	fn capture_failures (&self, sink: FailureSink)
	{
		self . inner . failures . bind (sink);
	}
}
