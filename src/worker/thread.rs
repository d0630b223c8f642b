use std::error::Error;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{Builder, JoinHandle};

use parking_lot::Mutex;
use tracing::{Level, event};

use crate::interrupt::Interrupt;
use crate::outcome::WorkerPanic;

use super::{Cancellable, FailureSink, FailureSlot, WorkerHandle};

pub type PanicHook = Box <dyn FnOnce (Arc <dyn Error + Send + Sync>) + Send>;

type Work = Box <dyn FnOnce (&Interrupt) + Send>;

/// A worker running on its own OS thread.
///
/// The work closure is handed an `Interrupt` that fires when the worker is
/// cancelled; long-running work should sleep on it or check it. A panic in
/// the work is reported to the owning future first and then to the panic
/// hook the worker was created with, if any.
#[derive (Clone)]
pub struct ThreadWorker
{
	inner: Arc <Inner>
}

struct Inner
{
	name: Option <String>,
	interrupt: Interrupt,
	cancelled: AtomicBool,
	failures: FailureSlot,
	panic_hook: Mutex <Option <PanicHook>>,
	work: Mutex <Option <Work>>,
	thread: Mutex <Option <JoinHandle <()>>>
}

impl ThreadWorker
{
	pub fn new <F> (work: F) -> Self
	where F: FnOnce (&Interrupt) + Send + 'static
	{
		Self::build (None, Box::new (work))
	}

	pub fn named <F> (name: impl Into <String>, work: F) -> Self
	where F: FnOnce (&Interrupt) + Send + 'static
	{
		Self::build (Some (name . into ()), Box::new (work))
	}

	fn build (name: Option <String>, work: Work) -> Self
	{
		Self
		{
			inner: Arc::new
			(
				Inner
				{
					name,
					interrupt: Interrupt::new (),
					cancelled: AtomicBool::new (false),
					failures: FailureSlot::new (),
					panic_hook: Mutex::new (None),
					work: Mutex::new (Some (work)),
					thread: Mutex::new (None)
				}
			)
		}
	}

	pub fn with_panic_hook <F> (self, hook: F) -> Self
	where F: FnOnce (Arc <dyn Error + Send + Sync>) + Send + 'static
	{
		*self . inner . panic_hook . lock () = Some (Box::new (hook));
		self
	}

	pub fn name (&self) -> Option <&str>
	{
		self . inner . name . as_deref ()
	}

	pub fn interrupt (&self) -> &Interrupt
	{
		&self . inner . interrupt
	}

	pub fn start (&self) -> io::Result <()>
	{
		let Some (work) = self . inner . work . lock () . take ()
		else
		{
			return Err
			(
				io::Error::new (io::ErrorKind::AlreadyExists, "worker thread already started")
			);
		};

		let mut builder = Builder::new ();

		if let Some (name) = &self . inner . name
		{
			builder = builder . name (name . clone ());
		}

		let inner = self . inner . clone ();
		let handle = builder . spawn (move || inner . run (work))?;

		*self . inner . thread . lock () = Some (handle);

		Ok (())
	}

	pub fn is_finished (&self) -> bool
	{
		self . inner . thread . lock () . as_ref ()
			. is_some_and (JoinHandle::is_finished)
	}

	/// Waits for the thread to exit. Returns immediately if it was never
	/// started or has already been joined.
	pub fn join (&self)
	{
		let handle = self . inner . thread . lock () . take ();

		if let Some (handle) = handle
		{
			// Panics are caught inside the thread, so joining cannot fail.
			let _ = handle . join ();
		}
	}
}

impl Inner
{
	fn run (&self, work: Work)
	{
		let result = catch_unwind (AssertUnwindSafe (|| work (&self . interrupt)));

		let Err (payload) = result
		else
		{
			return;
		};

		let panic = WorkerPanic::from_payload (&*payload);

		event!
		(
			Level::ERROR,
			worker = self . name . as_deref () . unwrap_or ("<unnamed>"),
			error = %panic,
			"worker thread panicked"
		);

		let failure: Arc <dyn Error + Send + Sync> = Arc::new (panic);

		self . failures . capture (failure . clone ());

		let hook = self . panic_hook . lock () . take ();

		if let Some (hook) = hook
		{
			hook (failure);
		}
	}
}

impl Cancellable for ThreadWorker
{
	fn cancel (&self) -> bool
	{
		let first = ! self . inner . cancelled . swap (true, Ordering::SeqCst);

		self . inner . interrupt . interrupt ();

		first
	}

	fn is_cancelled (&self) -> bool
	{
		self . inner . cancelled . load (Ordering::SeqCst)
	}
}

impl WorkerHandle for ThreadWorker
{
	fn capture_failures (&self, sink: FailureSink)
	{
		self . inner . failures . bind (sink);
	}
}
