mod failure_slot;
pub (crate) use failure_slot::FailureSlot;

mod flag;
pub use flag::CancelFlag;

mod thread;
pub use thread::{ThreadWorker, PanicHook};

mod task;
pub use task::TaskWorker;

mod signallable;
pub use signallable::SignallableWorker;

use std::error::Error;
use std::sync::Arc;

pub trait Cancellable: Send + Sync
{
	/// Returns `true` only for the call that actually moved this worker
	/// into the cancelled state.
	fn cancel (&self) -> bool;

	fn is_cancelled (&self) -> bool;
}

pub type FailureSink = Box <dyn FnOnce (Arc <dyn Error + Send + Sync>) + Send>;

/// A unit of background work a future can be bound to.
///
/// Workers that can fail out from under their producer (a panicking thread
/// or task) hand that failure to the sink installed by the owning future.
/// At most one failure is ever delivered.
pub trait WorkerHandle: Cancellable
{
	fn capture_failures (&self, sink: FailureSink)
	{
		drop (sink);
	}
}
