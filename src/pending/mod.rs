mod subscriber;
pub use subscriber::{Subscriber, SubscriptionId, OnComplete};

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{Level, event};

use crate::contract::{self, PreconditionViolation};
use crate::interrupt::{Interrupt, Wake};
use crate::outcome::{Elapsed, Outcome, Unavailable, WorkerPanic};

/// The single-writer, many-reader completion slot behind a future.
///
/// The first `set_final` wins; everything after it reads the stored
/// outcome. Blocking waits are bounded by the ceiling given at
/// construction, and a wait that runs out the clock is itself the write
/// that completes the result with a `Timeout`. Subscriber callbacks always
/// run after the lock has been released.
pub struct PendingResult <V>
{
	shared: Arc <Shared <V>>
}

struct Shared <V>
{
	max_timeout: Duration,
	next_subscription: AtomicU64,
	state: Mutex <State <V>>,
	completed: Condvar
}

struct State <V>
{
	final_value: Option <Outcome <V>>,
	partial_value: Option <Outcome <V>>,
	waiters: Vec <Waiter <V>>
}

struct Waiter <V>
{
	id: SubscriptionId,
	subscriber: Arc <dyn Subscriber <V>>
}

impl <V> Clone for PendingResult <V>
{
	fn clone (&self) -> Self
	{
		Self {shared: self . shared . clone ()}
	}
}

impl <V> PendingResult <V>
where V: Clone + Send + 'static
{
	pub fn new (max_timeout: Duration) -> Result <Self, PreconditionViolation>
	{
		let max_timeout = contract::must_be_greater_than_zero
		(
			"max_timeout",
			max_timeout
		)?;

		Ok (Self::with_ceiling (max_timeout))
	}

	pub (crate) fn with_ceiling (max_timeout: Duration) -> Self
	{
		Self
		{
			shared: Arc::new
			(
				Shared
				{
					max_timeout,
					next_subscription: AtomicU64::new (0),
					state: Mutex::new
					(
						State
						{
							final_value: None,
							partial_value: None,
							waiters: Vec::new ()
						}
					),
					completed: Condvar::new ()
				}
			)
		}
	}

	pub fn type_name (&self) -> &'static str
	{
		std::any::type_name::<V> ()
	}

	/// The ceiling fixed at construction.
	pub fn max_timeout (&self) -> Duration
	{
		self . shared . max_timeout
	}

	/// Zero once complete, otherwise the original ceiling. This is an
	/// advertised bound, not a countdown.
	pub fn remaining_timeout (&self) -> Duration
	{
		if self . is_complete ()
		{
			Duration::ZERO
		}
		else
		{
			self . shared . max_timeout
		}
	}

	pub fn is_complete (&self) -> bool
	{
		self . shared . state . lock () . final_value . is_some ()
	}

	pub fn has_partial (&self) -> bool
	{
		self . shared . state . lock () . partial_value . is_some ()
	}

	pub fn waiter_count (&self) -> usize
	{
		self . shared . state . lock () . waiters . len ()
	}

	pub fn final_value (&self) -> Option <Outcome <V>>
	{
		self . shared . state . lock () . final_value . clone ()
	}

	pub fn partial_value (&self) -> Option <Outcome <V>>
	{
		self . shared . state . lock () . partial_value . clone ()
	}

	pub fn peek (&self, unavailable: &Unavailable) -> Outcome <V>
	{
		let state = self . shared . state . lock ();

		state . final_value . as_ref ()
			. or (state . partial_value . as_ref ())
			. cloned ()
			. unwrap_or_else (|| Outcome::Empty (unavailable . clone ()))
	}

	pub fn wait (&self, timeout: Duration) -> Outcome <V>
	{
		self . wait_with (timeout, None, &Unavailable::still_blocking ())
	}

	/// Like `wait`, but gives up early once `interrupt` fires. An
	/// interrupted caller gets a `Cancelled` outcome of its own; the shared
	/// result stays pending for everybody else.
	pub fn wait_interruptibly (&self, timeout: Duration, interrupt: &Interrupt)
	-> Outcome <V>
	{
		self . wait_with (timeout, Some (interrupt), &Unavailable::still_blocking ())
	}

	pub (crate) fn wait_with
	(
		&self,
		timeout: Duration,
		interrupt: Option <&Interrupt>,
		unavailable: &Unavailable
	)
	-> Outcome <V>
	{
		let effective = timeout . min (self . shared . max_timeout);
		let started = Instant::now ();
		let deadline = started . checked_add (effective);

		let _registration = interrupt . map
		(
			|interrupt| interrupt . register (self . shared . clone ())
		);

		let mut state = self . shared . state . lock ();

		loop
		{
			if let Some (final_value) = &state . final_value
			{
				return final_value . clone ();
			}

			if effective . is_zero ()
			{
				return Outcome::Empty (unavailable . clone ());
			}

			if let Some (interrupt) = interrupt
			{
				if interrupt . is_interrupted ()
				{
					let elapsed = Elapsed::since (started, effective);

					event!
					(
						Level::DEBUG,
						%elapsed,
						"wait on pending result was interrupted"
					);

					return Outcome::Cancelled
					{
						partial: state . partial_value . clone () . map (Box::new),
						elapsed,
						reason: String::from ("wait was interrupted")
					};
				}
			}

			match deadline
			{
				Some (deadline) =>
				{
					if Instant::now () >= deadline
					{
						break;
					}

					self . shared . completed . wait_until (&mut state, deadline);
				}
				None => self . shared . completed . wait (&mut state)
			}
		}

		let elapsed = Elapsed::since (started, effective);

		event! (Level::DEBUG, %elapsed, "pending result timed out");

		let timeout = Outcome::Timeout
		{
			partial: state . partial_value . clone () . map (Box::new),
			elapsed
		};

		match self . complete_locked (&mut state, timeout . clone ())
		{
			Ok (waiters) =>
			{
				drop (state);
				self . notify_completed (waiters, &timeout);
				timeout
			}
			Err (existing) => existing
		}
	}

	/// Completes with whatever `build` makes of the current partial value,
	/// unless something else completed first.
	pub (crate) fn complete_with <F> (&self, build: F) -> Outcome <V>
	where F: FnOnce (Option <&Outcome <V>>) -> Outcome <V>
	{
		let mut state = self . shared . state . lock ();

		if let Some (final_value) = &state . final_value
		{
			return final_value . clone ();
		}

		let outcome = build (state . partial_value . as_ref ());

		match self . complete_locked (&mut state, outcome . clone ())
		{
			Ok (waiters) =>
			{
				drop (state);
				self . notify_completed (waiters, &outcome);
				outcome
			}
			Err (existing) => existing
		}
	}

	pub (crate) fn expire (&self, elapsed: Elapsed) -> Outcome <V>
	{
		self . complete_with
		(
			|partial| Outcome::Timeout
			{
				partial: partial . cloned () . map (Box::new),
				elapsed
			}
		)
	}

	/// Stores `outcome` if nothing has been stored yet and returns whatever
	/// ends up stored.
	pub fn set_final (&self, outcome: Outcome <V>) -> Outcome <V>
	{
		let mut state = self . shared . state . lock ();

		match self . complete_locked (&mut state, outcome . clone ())
		{
			Ok (waiters) =>
			{
				drop (state);
				self . notify_completed (waiters, &outcome);
				outcome
			}
			Err (existing) => existing
		}
	}

	pub fn set_partial (&self, outcome: Outcome <V>) -> Outcome <V>
	{
		let waiters: Vec <Waiter <V>> =
		{
			let mut state = self . shared . state . lock ();

			if let Some (final_value) = &state . final_value
			{
				return final_value . clone ();
			}

			state . partial_value = Some (outcome . clone ());

			state . waiters . iter ()
				. filter (|waiter| waiter . subscriber . wants_progress ())
				. map (Waiter::share)
				. collect ()
		};

		event! (Level::TRACE, listeners = waiters . len (), "partial result updated");

		for waiter in waiters
		{
			let delivery = catch_unwind
			(
				AssertUnwindSafe (|| waiter . subscriber . progress (&outcome))
			);

			if let Err (payload) = delivery
			{
				event!
				(
					Level::ERROR,
					subscription = %waiter . id,
					error = %WorkerPanic::from_payload (&*payload),
					"subscriber panicked while receiving a partial result"
				);
			}
		}

		outcome
	}

	pub fn subscribe (&self, subscriber: Arc <dyn Subscriber <V>>) -> SubscriptionId
	{
		let id = SubscriptionId
		(
			self . shared . next_subscription . fetch_add (1, Ordering::Relaxed)
		);

		let final_value =
		{
			let mut state = self . shared . state . lock ();

			if state . final_value . is_none ()
			{
				state . waiters . push (Waiter {id, subscriber});
				return id;
			}

			state . final_value . clone ()
		};

		// Already decided: deliver right here, on the caller's thread.
		if let Some (final_value) = final_value
		{
			self . notify_completed (vec! [Waiter {id, subscriber}], &final_value);
		}

		id
	}

	pub fn on_complete <F> (&self, callback: F) -> SubscriptionId
	where F: FnOnce (&Outcome <V>) + Send + 'static
	{
		self . subscribe (Arc::new (OnComplete::new (callback)))
	}

	fn complete_locked (&self, state: &mut State <V>, outcome: Outcome <V>)
	-> Result <Vec <Waiter <V>>, Outcome <V>>
	{
		if let Some (final_value) = &state . final_value
		{
			return Err (final_value . clone ());
		}

		state . final_value = Some (outcome);
		state . partial_value = None;

		self . shared . completed . notify_all ();

		Ok (std::mem::take (&mut state . waiters))
	}

	fn notify_completed (&self, waiters: Vec <Waiter <V>>, outcome: &Outcome <V>)
	{
		for waiter in waiters
		{
			let delivery = catch_unwind
			(
				AssertUnwindSafe (|| waiter . subscriber . completed (outcome))
			);

			if let Err (payload) = delivery
			{
				event!
				(
					Level::ERROR,
					subscription = %waiter . id,
					error = %WorkerPanic::from_payload (&*payload),
					"subscriber panicked while receiving the final result"
				);
			}
		}
	}
}

impl <V> PendingResult <V>
{
	/// Removes a subscription that has not fired yet. Returns `false` if it
	/// already fired or was never registered.
	pub fn unsubscribe (&self, id: SubscriptionId) -> bool
	{
		let mut state = self . shared . state . lock ();
		let before = state . waiters . len ();

		state . waiters . retain (|waiter| waiter . id != id);

		state . waiters . len () != before
	}
}

impl <V> Waiter <V>
{
	fn share (&self) -> Self
	{
		Self {id: self . id, subscriber: self . subscriber . clone ()}
	}
}

impl <V> Wake for Shared <V>
where V: Send
{
	fn wake (&self)
	{
		let _state = self . state . lock ();
		self . completed . notify_all ();
	}
}

impl <V> fmt::Display for PendingResult <V>
where V: fmt::Debug
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		let (final_value, partial_value, waiters) =
		{
			let state = self . shared . state . lock ();

			(
				state . final_value . as_ref () . map (ToString::to_string),
				state . partial_value . as_ref () . map (ToString::to_string),
				state . waiters . len ()
			)
		};

		if final_value . is_none ()
		{
			f . write_str ("unfinished ")?;
		}

		write!
		(
			f,
			"pending result <{}> (ceiling {:?}, {} waiting)",
			std::any::type_name::<V> (),
			self . shared . max_timeout,
			waiters
		)?;

		if let Some (final_value) = final_value
		{
			write! (f, ": {}", final_value)?;
		}
		else if let Some (partial_value) = partial_value
		{
			write! (f, ": partial {}", partial_value)?;
		}

		Ok (())
	}
}

impl <V> fmt::Debug for PendingResult <V>
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		let state = self . shared . state . lock ();

		f . debug_struct ("PendingResult")
			. field ("max_timeout", &self . shared . max_timeout)
			. field ("complete", &state . final_value . is_some ())
			. field ("partial", &state . partial_value . is_some ())
			. field ("waiters", &state . waiters . len ())
			. finish ()
	}
}
