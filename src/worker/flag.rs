use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{Cancellable, WorkerHandle};

/// Cancellation for work that is not a thread or a task: a callback chain,
/// an I/O request, anything that polls a flag or can be told to stop by a
/// hook.
#[derive (Clone)]
pub struct CancelFlag
{
	inner: Arc <Inner>
}

struct Inner
{
	cancelled: AtomicBool,
	on_cancel: Mutex <Option <Box <dyn FnOnce () + Send>>>
}

impl CancelFlag
{
	pub fn new () -> Self
	{
		Self
		{
			inner: Arc::new
			(
				Inner {cancelled: AtomicBool::new (false), on_cancel: Mutex::new (None)}
			)
		}
	}

	pub fn on_cancel <F> (on_cancel: F) -> Self
	where F: FnOnce () + Send + 'static
	{
		let flag = Self::new ();
		*flag . inner . on_cancel . lock () = Some (Box::new (on_cancel));
		flag
	}
}

impl Default for CancelFlag
{
	fn default () -> Self
	{
		Self::new ()
	}
}

impl Cancellable for CancelFlag
{
	fn cancel (&self) -> bool
	{
		if self . inner . cancelled . swap (true, Ordering::SeqCst)
		{
			return false;
		}

		let on_cancel = self . inner . on_cancel . lock () . take ();

		if let Some (on_cancel) = on_cancel
		{
			on_cancel ();
		}

		true
	}

	fn is_cancelled (&self) -> bool
	{
		self . inner . cancelled . load (Ordering::SeqCst)
	}
}

impl WorkerHandle for CancelFlag {}

#[cfg (test)]
mod tests
{
	use std::sync::atomic::AtomicUsize;

	use super::*;

	#[test]
	fn cancel_transitions_once ()
	{
		let calls = Arc::new (AtomicUsize::new (0));
		let counter = calls . clone ();
		let flag = CancelFlag::on_cancel (move || { counter . fetch_add (1, Ordering::SeqCst); });

		assert! (! flag . is_cancelled ());
		assert! (flag . cancel ());
		assert! (! flag . clone () . cancel ());
		assert! (flag . is_cancelled ());
		assert_eq! (calls . load (Ordering::SeqCst), 1);
	}
}
