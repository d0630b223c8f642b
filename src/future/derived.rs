use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{Level, event};

use crate::outcome::{Failure, Outcome, WorkerPanic};
use crate::pending::{PendingResult, Subscriber, SubscriptionId};
use crate::worker::{Cancellable, WorkerHandle};

use super::Operation;

// Subscribed to the parent; feeds the derived result.
pub (super) struct DerivedLink <V, O, P>
{
	operation: P,
	target: PendingResult <O>,
	_parent: PhantomData <fn (&V)>
}

impl <V, O, P> DerivedLink <V, O, P>
{
	pub (super) fn new (operation: P, target: PendingResult <O>) -> Self
	{
		Self {operation, target, _parent: PhantomData}
	}
}

impl <V, O, P> Subscriber <V> for DerivedLink <V, O, P>
where
	O: Clone + Send + 'static,
	P: Operation <V, O>
{
	fn completed (&self, outcome: &Outcome <V>)
	{
		let derived = match catch_unwind (AssertUnwindSafe (|| self . operation . apply (outcome)))
		{
			Ok (derived) => derived,
			Err (payload) =>
			{
				let panic = WorkerPanic::from_payload (&*payload);

				event! (Level::ERROR, error = %panic, "operation panicked while deriving a result");

				Outcome::Error
				(
					Failure::new ("operation failed while deriving a result") . with_source (panic)
				)
			}
		};

		self . target . set_final (derived);
	}

	fn wants_progress (&self) -> bool
	{
		self . operation . is_progressive ()
	}

	fn progress (&self, partial: &Outcome <V>)
	{
		if let Some (derived) = self . operation . progress (partial)
		{
			self . target . set_partial (derived);
		}
	}
}

// The worker behind a derived future. Cancelling it only detaches the
// derived future from its parent; the parent keeps running.
pub (super) struct Derivation <V>
{
	parent: PendingResult <V>,
	subscription: Mutex <Option <SubscriptionId>>,
	cancelled: AtomicBool
}

impl <V> Derivation <V>
{
	pub (super) fn new (parent: PendingResult <V>) -> Self
	{
		Self
		{
			parent,
			subscription: Mutex::new (None),
			cancelled: AtomicBool::new (false)
		}
	}

	pub (super) fn attach (&self, id: SubscriptionId)
	{
		*self . subscription . lock () = Some (id);

		if self . cancelled . load (Ordering::SeqCst)
		{
			self . detach ();
		}
	}

	fn detach (&self)
	{
		let subscription = self . subscription . lock () . take ();

		if let Some (id) = subscription
		{
			self . parent . unsubscribe (id);
		}
	}
}

impl <V> Cancellable for Derivation <V>
where V: Send
{
	fn cancel (&self) -> bool
	{
		if self . cancelled . swap (true, Ordering::SeqCst)
		{
			return false;
		}

		self . detach ();

		true
	}

	fn is_cancelled (&self) -> bool
	{
		self . cancelled . load (Ordering::SeqCst)
	}
}

impl <V> WorkerHandle for Derivation <V>
where V: Send {}
