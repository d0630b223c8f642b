pub mod logic;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{Level, event};

use crate::contract::{self, PreconditionViolation};
use crate::future::BlockingFuture;
use crate::outcome::{Failure, Outcome, WorkerPanic};
use crate::pending::{PendingResult, Subscriber};
use crate::worker::{Cancellable, WorkerHandle};

type Reduce <V> = Box <dyn Fn (&Outcome <V>, &Outcome <V>) -> Outcome <V> + Send + Sync>;

/// Folds the outcomes of several futures into one result, in the order the
/// children complete.
///
/// The aggregate completes once every child has reported, whatever each
/// child's outcome was. Short-circuiting on a decisive child is up to the
/// reduction. A reduction that panics on a child's outcome has that
/// child's contribution replaced by an `Error` outcome.
pub struct Aggregator <V>
{
	shared: Arc <Shared <V>>,
	children: Vec <BlockingFuture <V>>
}

struct Shared <V>
{
	pending: PendingResult <V>,
	expected: usize,
	fold: Mutex <Fold <V>>,
	cancelled: AtomicBool,
	reduce: Reduce <V>
}

struct Fold <V>
{
	collected: usize,
	accumulator: Outcome <V>
}

struct Collect <V>
{
	shared: Arc <Shared <V>>
}

impl <V> Aggregator <V>
where V: Clone + Send + 'static
{
	pub fn new <F> (children: Vec <BlockingFuture <V>>, seed: Outcome <V>, reduce: F)
	-> Result <Self, PreconditionViolation>
	where F: Fn (&Outcome <V>, &Outcome <V>) -> Outcome <V> + Send + Sync + 'static
	{
		contract::must_not_be_empty ("children", &children)?;

		let ceiling = children . iter ()
			. map (|child| child . pending () . max_timeout ())
			. max ()
			. unwrap_or_default ();

		let shared = Arc::new
		(
			Shared
			{
				pending: PendingResult::new (ceiling)?,
				expected: children . len (),
				fold: Mutex::new (Fold {collected: 0, accumulator: seed}),
				cancelled: AtomicBool::new (false),
				reduce: Box::new (reduce)
			}
		);

		for child in &children
		{
			child . pending () . subscribe (Arc::new (Collect {shared: shared . clone ()}));
		}

		Ok (Self {shared, children})
	}

	pub fn expected_count (&self) -> usize
	{
		self . shared . expected
	}

	pub fn collected_count (&self) -> usize
	{
		self . shared . fold . lock () . collected
	}

	pub fn children (&self) -> &[BlockingFuture <V>]
	{
		&self . children
	}

	pub fn pending (&self) -> &PendingResult <V>
	{
		&self . shared . pending
	}

	/// The aggregate as a future of its own. Cancelling it cancels every
	/// child and stops folding.
	pub fn into_future (self) -> BlockingFuture <V>
	{
		let pending = self . shared . pending . clone ();

		BlockingFuture::new
		(
			Children {shared: self . shared, children: self . children},
			pending
		)
	}
}

impl Aggregator <bool>
{
	/// True once every child is true.
	pub fn all (children: Vec <BlockingFuture <bool>>) -> Result <Self, PreconditionViolation>
	{
		Self::new (children, Outcome::one (true), logic::and)
	}

	/// True once any child is true.
	pub fn any (children: Vec <BlockingFuture <bool>>) -> Result <Self, PreconditionViolation>
	{
		Self::new (children, Outcome::one (false), logic::or)
	}
}

impl <V> Shared <V>
where V: Clone + Send + 'static
{
	fn fold_in (&self, outcome: &Outcome <V>)
	{
		if self . cancelled . load (Ordering::SeqCst)
		{
			return;
		}

		let finished =
		{
			let mut fold = self . fold . lock ();

			if fold . collected >= self . expected
			{
				return;
			}

			let accumulator = match self . reduce_one (&fold . accumulator, outcome)
			{
				Ok (accumulator) => accumulator,
				Err (panic) =>
				{
					event!
					(
						Level::ERROR,
						error = %panic,
						"reduction panicked; folding an error in place of the child result"
					);

					let failure = Outcome::Error
					(
						Failure::new ("child result could not be reduced") . with_source (panic)
					);

					self . reduce_one (&fold . accumulator, &failure)
						. unwrap_or (failure)
				}
			};

			fold . accumulator = accumulator;
			fold . collected += 1;

			event!
			(
				Level::TRACE,
				collected = fold . collected,
				expected = self . expected,
				"aggregator folded a child result"
			);

			(fold . collected == self . expected) . then (|| fold . accumulator . clone ())
		};

		if let Some (aggregate) = finished
		{
			event! (Level::DEBUG, children = self . expected, "aggregator collected every child result");

			self . pending . set_final (aggregate);
		}
	}

	fn reduce_one (&self, accumulator: &Outcome <V>, outcome: &Outcome <V>)
	-> Result <Outcome <V>, WorkerPanic>
	{
		catch_unwind (AssertUnwindSafe (|| (self . reduce) (accumulator, outcome)))
			. map_err (|payload| WorkerPanic::from_payload (&*payload))
	}
}

impl <V> Subscriber <V> for Collect <V>
where V: Clone + Send + 'static
{
	fn completed (&self, outcome: &Outcome <V>)
	{
		self . shared . fold_in (outcome);
	}
}

struct Children <V>
{
	shared: Arc <Shared <V>>,
	children: Vec <BlockingFuture <V>>
}

impl <V> Cancellable for Children <V>
where V: Clone + Send + 'static
{
	fn cancel (&self) -> bool
	{
		if self . shared . cancelled . swap (true, Ordering::SeqCst)
		{
			return false;
		}

		for child in &self . children
		{
			child . cancel ("aggregate was cancelled");
		}

		true
	}

	fn is_cancelled (&self) -> bool
	{
		self . shared . cancelled . load (Ordering::SeqCst)
	}
}

impl <V> WorkerHandle for Children <V>
where V: Clone + Send + 'static {}

impl <V> fmt::Display for Aggregator <V>
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write!
		(
			f,
			"aggregator <{}> ({} / {} results collected)",
			std::any::type_name::<V> (),
			self . shared . fold . lock () . collected,
			self . shared . expected
		)
	}
}
