use std::error::Error;
use std::sync::Arc;

use parking_lot::Mutex;

use super::FailureSink;

// Holds on to a failure that happens before anybody is listening, so a
// worker started ahead of its future still gets its panic reported.
pub (crate) struct FailureSlot
{
	state: Mutex <SlotState>
}

enum SlotState
{
	Empty,
	Bound (FailureSink),
	Captured (Arc <dyn Error + Send + Sync>),
	Delivered
}

impl FailureSlot
{
	pub (crate) fn new () -> Self
	{
		Self {state: Mutex::new (SlotState::Empty)}
	}

	pub (crate) fn bind (&self, sink: FailureSink)
	{
		let captured =
		{
			let mut state = self . state . lock ();

			match std::mem::replace (&mut *state, SlotState::Delivered)
			{
				SlotState::Empty | SlotState::Bound (_) =>
				{
					*state = SlotState::Bound (sink);
					return;
				}
				SlotState::Captured (failure) => failure,
				SlotState::Delivered => return
			}
		};

		sink (captured);
	}

	pub (crate) fn capture (&self, failure: Arc <dyn Error + Send + Sync>) -> bool
	{
		let sink =
		{
			let mut state = self . state . lock ();

			match std::mem::replace (&mut *state, SlotState::Delivered)
			{
				SlotState::Empty =>
				{
					*state = SlotState::Captured (failure);
					return true;
				}
				SlotState::Bound (sink) => sink,
				SlotState::Captured (earlier) =>
				{
					*state = SlotState::Captured (earlier);
					return false;
				}
				SlotState::Delivered => return false
			}
		};

		sink (failure);

		true
	}
}

#[cfg (test)]
mod tests
{
	use std::sync::atomic::{AtomicUsize, Ordering};

	use crate::outcome::WorkerPanic;

	use super::*;

	fn counting_sink (count: &Arc <AtomicUsize>) -> FailureSink
	{
		let count = count . clone ();

		Box::new (move |_| { count . fetch_add (1, Ordering::SeqCst); })
	}

	#[test]
	fn failure_before_binding_is_delivered_on_bind ()
	{
		let slot = FailureSlot::new ();
		let count = Arc::new (AtomicUsize::new (0));

		assert! (slot . capture (Arc::new (WorkerPanic::new ("early"))));
		assert_eq! (count . load (Ordering::SeqCst), 0);

		slot . bind (counting_sink (&count));
		assert_eq! (count . load (Ordering::SeqCst), 1);
	}

	#[test]
	fn only_the_first_failure_is_delivered ()
	{
		let slot = FailureSlot::new ();
		let count = Arc::new (AtomicUsize::new (0));

		slot . bind (counting_sink (&count));

		assert! (slot . capture (Arc::new (WorkerPanic::new ("first"))));
		assert! (! slot . capture (Arc::new (WorkerPanic::new ("second"))));
		assert_eq! (count . load (Ordering::SeqCst), 1);
	}
}
