use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

#[derive (Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error ("interrupted")]
pub struct Interrupted;

pub (crate) trait Wake: Send + Sync
{
	fn wake (&self);
}

/// An explicit interruption request shared between whoever wants a thread
/// to stop waiting and the thread itself.
///
/// Once interrupted it stays interrupted. Blocked `PendingResult` waits
/// that were handed this token, and `sleep` calls on it, return early.
#[derive (Clone, Default)]
pub struct Interrupt
{
	shared: Arc <Shared>
}

#[derive (Default)]
struct Shared
{
	interrupted: AtomicBool,
	next_registration: AtomicU64,
	wakers: Mutex <Vec <(u64, Arc <dyn Wake>)>>,
	sleepers: Condvar
}

pub (crate) struct Registration
{
	interrupt: Interrupt,
	id: u64
}

impl Interrupt
{
	pub fn new () -> Self
	{
		Self::default ()
	}

	pub fn interrupt (&self) -> bool
	{
		let first = ! self . shared . interrupted . swap (true, Ordering::SeqCst);

		let wakers: Vec <Arc <dyn Wake>> =
		{
			let wakers = self . shared . wakers . lock ();
			self . shared . sleepers . notify_all ();
			wakers . iter () . map (|(_, waker)| waker . clone ()) . collect ()
		};

		for waker in wakers
		{
			waker . wake ();
		}

		first
	}

	pub fn is_interrupted (&self) -> bool
	{
		self . shared . interrupted . load (Ordering::SeqCst)
	}

	pub fn check (&self) -> Result <(), Interrupted>
	{
		if self . is_interrupted ()
		{
			Err (Interrupted)
		}
		else
		{
			Ok (())
		}
	}

	pub fn sleep (&self, duration: Duration) -> Result <(), Interrupted>
	{
		let Some (deadline) = Instant::now () . checked_add (duration)
		else
		{
			return self . sleep_until_interrupted ();
		};

		let mut wakers = self . shared . wakers . lock ();

		loop
		{
			self . check ()?;

			if self . shared . sleepers . wait_until (&mut wakers, deadline)
				. timed_out ()
			{
				return self . check ();
			}
		}
	}

	fn sleep_until_interrupted (&self) -> Result <(), Interrupted>
	{
		let mut wakers = self . shared . wakers . lock ();

		while ! self . is_interrupted ()
		{
			self . shared . sleepers . wait (&mut wakers);
		}

		Err (Interrupted)
	}

	// The waker must be registered before the caller checks
	// `is_interrupted` under its own lock, otherwise an interruption landing
	// between the check and the wait would be lost.
	pub (crate) fn register (&self, waker: Arc <dyn Wake>) -> Registration
	{
		let id = self . shared . next_registration . fetch_add (1, Ordering::Relaxed);
		self . shared . wakers . lock () . push ((id, waker));

		Registration {interrupt: self . clone (), id}
	}
}

impl Drop for Registration
{
	fn drop (&mut self)
	{
		self . interrupt . shared . wakers . lock ()
			. retain (|(id, _)| *id != self . id);
	}
}

impl std::fmt::Debug for Interrupt
{
	fn fmt (&self, f: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		f . debug_struct ("Interrupt")
			. field ("interrupted", &self . is_interrupted ())
			. finish ()
	}
}

#[cfg (test)]
mod tests
{
	use std::thread;

	use super::*;

	#[test]
	fn sleep_runs_to_completion_without_interruption ()
	{
		let interrupt = Interrupt::new ();
		let started = Instant::now ();

		assert_eq! (interrupt . sleep (Duration::from_millis (50)), Ok (()));
		assert! (started . elapsed () >= Duration::from_millis (50));
	}

	#[test]
	fn interrupt_cuts_sleep_short ()
	{
		let interrupt = Interrupt::new ();
		let sleeper = interrupt . clone ();
		let started = Instant::now ();

		let handle = thread::spawn (move || sleeper . sleep (Duration::from_secs (10)));

		thread::sleep (Duration::from_millis (50));
		assert! (interrupt . interrupt ());
		assert! (! interrupt . interrupt ());

		assert_eq! (handle . join () . unwrap (), Err (Interrupted));
		assert! (started . elapsed () < Duration::from_secs (5));
	}

	#[test]
	fn registrations_are_removed_on_drop ()
	{
		struct Nothing;

		impl Wake for Nothing
		{
			fn wake (&self) {}
		}

		let interrupt = Interrupt::new ();
		let registration = interrupt . register (Arc::new (Nothing));
		assert_eq! (interrupt . shared . wakers . lock () . len (), 1);

		drop (registration);
		assert! (interrupt . shared . wakers . lock () . is_empty ());
	}
}
