mod completion;
pub use completion::{Completion, SubscriptionGuard};

mod derived;
use derived::{DerivedLink, Derivation};

mod operation;
pub use operation::{Operation, Progressive};

mod progress;
pub use progress::Progress;

mod provenance;
pub use provenance::FutureId;
use provenance::Provenance;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{Level, event};

use crate::interrupt::Interrupt;
use crate::outcome::{Elapsed, Failure, FilterState, Outcome, Unavailable};
use crate::pending::{PendingResult, SubscriptionId};
use crate::worker::{Cancellable, WorkerHandle};

use completion::Deliver;
use progress::Feed;

/// The consumer's handle on one asynchronous computation: a
/// `PendingResult` bound to the worker producing it.
///
/// Only the `wait` family blocks. Every value accessor answers from the
/// final outcome if there is one and otherwise reports that nothing is
/// available yet.
pub struct BlockingFuture <V>
{
	pending: PendingResult <V>,
	worker: Arc <dyn Cancellable>,
	provenance: Arc <Provenance>,
	created: Instant,
	unavailable: Unavailable
}

impl <V> Clone for BlockingFuture <V>
{
	fn clone (&self) -> Self
	{
		Self
		{
			pending: self . pending . clone (),
			worker: self . worker . clone (),
			provenance: self . provenance . clone (),
			created: self . created,
			unavailable: self . unavailable . clone ()
		}
	}
}

impl <V> BlockingFuture <V>
{
	/// Records `cause` as the future this one was derived from.
	pub fn caused_by <U> (mut self, cause: &BlockingFuture <U>) -> Self
	{
		self . provenance = Provenance::derived (&cause . provenance);
		self
	}

	/// The diagnostic handed out while no value is available.
	pub fn with_unavailable (mut self, unavailable: Unavailable) -> Self
	{
		self . unavailable = unavailable;
		self
	}

	pub fn pending (&self) -> &PendingResult <V>
	{
		&self . pending
	}

	pub fn id (&self) -> FutureId
	{
		self . provenance . id ()
	}

	/// The future this one was derived from, or this future itself.
	pub fn cause (&self) -> FutureId
	{
		self . provenance . cause ()
	}

	pub fn cause_root (&self) -> FutureId
	{
		self . provenance . cause_root ()
	}

	pub fn created (&self) -> Instant
	{
		self . created
	}

	/// Whether the worker was told to stop. The result may still have
	/// completed some other way first.
	pub fn is_cancelled (&self) -> bool
	{
		self . worker . is_cancelled ()
	}
}

impl <V> BlockingFuture <V>
where V: Clone + Send + 'static
{
	/// Binds `pending` to `worker`. If the worker fails (a panicking
	/// thread or task) the failure becomes this future's `Error` outcome.
	pub fn new <W> (worker: W, pending: PendingResult <V>) -> Self
	where W: WorkerHandle + 'static
	{
		let created = Instant::now ();
		let target = pending . clone ();

		worker . capture_failures
		(
			Box::new
			(
				move |failure|
				{
					let elapsed = Elapsed::since (created, target . max_timeout ());

					target . set_final
					(
						Outcome::Error
						(
							Failure::new (failure . to_string ())
								. with_elapsed (elapsed)
								. with_shared_source (failure)
						)
					);
				}
			)
		);

		Self
		{
			pending,
			worker: Arc::new (worker),
			provenance: Provenance::root (),
			created,
			unavailable: Unavailable::still_blocking ()
		}
	}

	pub fn wait (&self, timeout: Duration) -> Outcome <V>
	{
		self . pending . wait_with (timeout, None, &self . unavailable)
	}

	pub fn wait_interruptibly (&self, timeout: Duration, interrupt: &Interrupt)
	-> Outcome <V>
	{
		self . pending . wait_with (timeout, Some (interrupt), &self . unavailable)
	}

	/// The async counterpart of `wait`. Running out the clock completes the
	/// result with a `Timeout`, exactly as a blocking wait would.
	pub async fn wait_async (&self, timeout: Duration) -> Outcome <V>
	{
		let effective = timeout . min (self . pending . max_timeout ());

		if let Some (final_value) = self . pending . final_value ()
		{
			return final_value;
		}

		if effective . is_zero ()
		{
			return Outcome::Empty (self . unavailable . clone ());
		}

		let started = Instant::now ();

		match tokio::time::timeout (effective, self . completion ()) . await
		{
			Ok (outcome) => outcome,
			Err (_) =>
			{
				let elapsed = Elapsed::since (started, effective);

				event! (Level::DEBUG, future = %self . id (), %elapsed, "pending result timed out");

				self . pending . expire (elapsed)
			}
		}
	}

	/// Stops the worker and, if this call is the one that stopped it,
	/// completes the result as `Cancelled` with the latest partial value.
	/// Returns whatever the result holds afterwards, which is the earlier
	/// outcome if the computation finished first.
	pub fn cancel (&self, reason: impl Into <String>) -> Outcome <V>
	{
		if self . worker . cancel ()
		{
			let elapsed = Elapsed::since (self . created, self . pending . max_timeout ());
			let reason = reason . into ();

			event!
			(
				Level::DEBUG,
				future = %self . id (),
				%elapsed,
				reason = reason . as_str (),
				"cancelling future"
			);

			self . pending . complete_with
			(
				|partial| Outcome::Cancelled
				{
					partial: partial . cloned () . map (Box::new),
					elapsed,
					reason
				}
			);
		}

		self . wait (Duration::ZERO)
	}

	pub fn is_complete (&self) -> bool
	{
		self . pending . is_complete ()
	}

	pub fn peek_partial_or_none (&self) -> Outcome <V>
	{
		self . pending . peek (&self . unavailable)
	}

	/// The advertised ceiling on blocking, or zero once complete.
	pub fn blocking_max (&self) -> Duration
	{
		self . pending . remaining_timeout ()
	}

	pub fn completed (&self) -> Option <Outcome <V>>
	{
		self . pending . final_value ()
	}

	pub fn has_value (&self) -> bool
	{
		self . completed () . is_some_and (|outcome| outcome . has_value ())
	}

	pub fn count (&self) -> usize
	{
		self . completed () . map_or (0, |outcome| outcome . count ())
	}

	pub fn iter (&self) -> std::vec::IntoIter <V>
	{
		match self . completed ()
		{
			Some (Outcome::Success (values)) => values . into_iter (),
			_ => Vec::new () . into_iter ()
		}
	}

	pub fn or_default (&self, default: V) -> V
	{
		match self . completed ()
		{
			Some (outcome) => outcome . or_default (default),
			None => default
		}
	}

	pub fn or_none (&self) -> Option <V>
	{
		self . completed () . and_then (|outcome| outcome . or_none ())
	}

	pub fn or_fail (&self) -> Result <V, Failure>
	{
		match self . completed ()
		{
			Some (outcome) => outcome . or_fail (),
			None => Err (Failure::from (self . unavailable . clone ()))
		}
	}

	/// The first value of the final outcome, or of the latest partial one
	/// while still pending.
	pub fn head (&self) -> Option <V>
	{
		self . peek_partial_or_none () . or_none ()
	}

	pub fn filter (&self) -> FilterState
	{
		self . completed () . map_or (FilterState::Discarded, |outcome| outcome . filter ())
	}

	pub fn on_complete <F> (&self, callback: F) -> SubscriptionId
	where F: FnOnce (&Outcome <V>) + Send + 'static
	{
		self . pending . on_complete (callback)
	}

	pub fn unsubscribe (&self, id: SubscriptionId) -> bool
	{
		self . pending . unsubscribe (id)
	}

	/// A future whose outcome is `operation` applied to this one's.
	///
	/// The derived future shares this future's ceiling. Cancelling it
	/// detaches it from this future without cancelling this future.
	pub fn subscribe <O, P> (&self, operation: P) -> BlockingFuture <O>
	where
		O: Clone + Send + 'static,
		P: Operation <V, O> + 'static
	{
		let target = PendingResult::with_ceiling (self . pending . max_timeout ());
		let derivation = Arc::new (Derivation::new (self . pending . clone ()));

		let derived = BlockingFuture::new (SharedWorker (derivation . clone ()), target . clone ())
			. caused_by (self);

		let id = self . pending . subscribe (Arc::new (DerivedLink::new (operation, target)));
		derivation . attach (id);

		derived
	}

	pub fn completion (&self) -> Completion <V>
	{
		let (sender, receiver) = oneshot::channel ();
		let id = self . pending . subscribe (Arc::new (Deliver::new (sender)));

		Completion::new (receiver, SubscriptionGuard::new (self . pending . clone (), id))
	}

	pub fn progress (&self) -> Progress <V>
	where V: Sync
	{
		let (sender, receiver) = watch::channel (None);
		let feed = Arc::new (Feed::new (sender));
		let id = self . pending . subscribe (feed . clone ());

		if let Some (partial) = self . pending . partial_value ()
		{
			feed . seed (partial);
		}

		Progress::new
		(
			WatchStream::new (receiver),
			SubscriptionGuard::new (self . pending . clone (), id)
		)
	}
}

// Lets a worker that is also referenced elsewhere be handed to
// `BlockingFuture::new`.
struct SharedWorker <W> (Arc <W>);

impl <W> Cancellable for SharedWorker <W>
where W: Cancellable
{
	fn cancel (&self) -> bool
	{
		self . 0 . cancel ()
	}

	fn is_cancelled (&self) -> bool
	{
		self . 0 . is_cancelled ()
	}
}

impl <W> WorkerHandle for SharedWorker <W>
where W: WorkerHandle
{
	fn capture_failures (&self, sink: crate::worker::FailureSink)
	{
		self . 0 . capture_failures (sink);
	}
}

impl <V> fmt::Display for BlockingFuture <V>
where V: fmt::Debug
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write! (f, "{} ({})", self . id (), self . pending)
	}
}

impl <V> fmt::Debug for BlockingFuture <V>
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		f . debug_struct ("BlockingFuture")
			. field ("id", &self . id ())
			. field ("cause", &self . cause ())
			. field ("pending", &self . pending)
			. field ("cancelled", &self . worker . is_cancelled ())
			. finish ()
	}
}
