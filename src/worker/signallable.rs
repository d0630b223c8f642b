use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot::{self, Receiver, Sender};

use super::{Cancellable, FailureSink, FailureSlot, WorkerHandle};
use super::task::monitor;

/// A worker running as a tokio task that is asked to stop rather than
/// aborted: cancelling fires the shutdown receiver handed to the task's
/// constructor, and the task decides how to wind down.
#[derive (Clone)]
pub struct SignallableWorker
{
	inner: Arc <Inner>
}

struct Inner
{
	shutdown_trigger: Mutex <Option <Sender <()>>>,
	cancelled: AtomicBool,
	failures: Arc <FailureSlot>
}

impl SignallableWorker
{
	pub fn spawn <C, F> (constructor: C) -> Self
	where
		C: FnOnce (Receiver <()>) -> F,
		F: Future <Output = ()> + Send + 'static
	{
		let (shutdown_trigger, shutdown) = oneshot::channel ();
		let failures = Arc::new (FailureSlot::new ());

		monitor (tokio::task::spawn (constructor (shutdown)), failures . clone ());

		Self
		{
			inner: Arc::new
			(
				Inner
				{
					shutdown_trigger: Mutex::new (Some (shutdown_trigger)),
					cancelled: AtomicBool::new (false),
					failures
				}
			)
		}
	}
}

impl Cancellable for SignallableWorker
{
	fn cancel (&self) -> bool
	{
		if self . inner . cancelled . swap (true, Ordering::SeqCst)
		{
			return false;
		}

		let shutdown_trigger = self . inner . shutdown_trigger . lock () . take ();

		if let Some (shutdown_trigger) = shutdown_trigger
		{
			let _ = shutdown_trigger . send (());
		}

		true
	}

	fn is_cancelled (&self) -> bool
	{
		self . inner . cancelled . load (Ordering::SeqCst)
	}
}

impl WorkerHandle for SignallableWorker
{
	fn capture_failures (&self, sink: FailureSink)
	{
		self . inner . failures . bind (sink);
	}
}
