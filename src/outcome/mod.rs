mod elapsed;
pub use elapsed::Elapsed;

mod failure;
pub use failure::{Failure, WorkerPanic};

mod unavailable;
pub use unavailable::Unavailable;

use std::fmt;

#[derive (Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum FilterState
{
	Kept,
	Discarded
}

/// The resolved (or, for `Empty`, not yet resolved) state of an
/// asynchronous computation.
///
/// `Timeout` and `Cancelled` carry whatever partial outcome the worker had
/// published when the result was decided. `Empty` is only ever handed out
/// by non-blocking reads of a result that is still pending; it is never
/// stored as a final value by this crate.
#[derive (Clone, Debug)]
pub enum Outcome <V>
{
	Success (Vec <V>),
	Timeout
	{
		partial: Option <Box <Outcome <V>>>,
		elapsed: Elapsed
	},
	Cancelled
	{
		partial: Option <Box <Outcome <V>>>,
		elapsed: Elapsed,
		reason: String
	},
	Error (Failure),
	Empty (Unavailable)
}

impl <V> Outcome <V>
{
	pub fn one (value: V) -> Self
	{
		Self::Success (vec! [value])
	}

	pub fn many <I> (values: I) -> Self
	where I: IntoIterator <Item = V>
	{
		Self::Success (values . into_iter () . collect ())
	}

	pub fn error (failure: Failure) -> Self
	{
		Self::Error (failure)
	}

	pub fn is_success (&self) -> bool
	{
		matches! (self, Self::Success (_))
	}

	pub fn is_timeout (&self) -> bool
	{
		matches! (self, Self::Timeout {..})
	}

	pub fn is_cancelled (&self) -> bool
	{
		matches! (self, Self::Cancelled {..})
	}

	pub fn is_error (&self) -> bool
	{
		matches! (self, Self::Error (_))
	}

	pub fn is_empty (&self) -> bool
	{
		matches! (self, Self::Empty (_))
	}

	pub fn values (&self) -> &[V]
	{
		match self
		{
			Self::Success (values) => values,
			_ => &[]
		}
	}

	pub fn partial (&self) -> Option <&Outcome <V>>
	{
		match self
		{
			Self::Timeout {partial, ..} | Self::Cancelled {partial, ..} =>
				partial . as_deref (),
			_ => None
		}
	}

	pub fn elapsed (&self) -> Option <Elapsed>
	{
		match self
		{
			Self::Timeout {elapsed, ..} | Self::Cancelled {elapsed, ..} =>
				Some (*elapsed),
			Self::Error (failure) => failure . elapsed (),
			_ => None
		}
	}

	pub fn count (&self) -> usize
	{
		self . values () . len ()
	}

	pub fn first (&self) -> Option <&V>
	{
		self . values () . first ()
	}

	pub fn has_value (&self) -> bool
	{
		! self . values () . is_empty ()
	}

	pub fn filter (&self) -> FilterState
	{
		match self
		{
			Self::Success (_) => FilterState::Kept,
			_ => FilterState::Discarded
		}
	}

	pub fn map <O, F> (self, mut f: F) -> Outcome <O>
	where F: FnMut (V) -> O
	{
		self . map_with (&mut f)
	}

	fn map_with <O, F> (self, f: &mut F) -> Outcome <O>
	where F: FnMut (V) -> O
	{
		match self
		{
			Self::Success (values) =>
				Outcome::Success (values . into_iter () . map (&mut *f) . collect ()),
			Self::Timeout {partial, elapsed} => Outcome::Timeout
			{
				partial: partial . map (|partial| Box::new ((*partial) . map_with (f))),
				elapsed
			},
			Self::Cancelled {partial, elapsed, reason} => Outcome::Cancelled
			{
				partial: partial . map (|partial| Box::new ((*partial) . map_with (f))),
				elapsed,
				reason
			},
			Self::Error (failure) => Outcome::Error (failure),
			Self::Empty (unavailable) => Outcome::Empty (unavailable)
		}
	}

	pub fn into_values (self) -> Result <Vec <V>, Failure>
	{
		match self
		{
			Self::Success (values) => Ok (values),
			other => Err (other . into_failure ())
		}
	}

	fn into_failure (self) -> Failure
	{
		match self
		{
			Self::Success (_) => Failure::new ("no value"),
			Self::Timeout {elapsed, ..} =>
				Failure::new (format! ("timed out after {}", elapsed))
					. with_elapsed (elapsed),
			Self::Cancelled {elapsed, reason, ..} =>
				Failure::new (format! ("cancelled after {}: {}", elapsed, reason))
					. with_elapsed (elapsed),
			Self::Error (failure) => failure,
			Self::Empty (unavailable) => Failure::from (unavailable)
		}
	}
}

impl <V> Outcome <V>
where V: Clone
{
	pub fn or_default (&self, default: V) -> V
	{
		self . first () . cloned () . unwrap_or (default)
	}

	pub fn or_none (&self) -> Option <V>
	{
		self . first () . cloned ()
	}

	pub fn or_fail (&self) -> Result <V, Failure>
	{
		match self . first ()
		{
			Some (value) => Ok (value . clone ()),
			None => Err (self . clone () . into_failure ())
		}
	}
}

// Elapsed times never take part in equality: two timeouts of the same
// partial value are the same outcome no matter how long each one waited.
impl <V> PartialEq for Outcome <V>
where V: PartialEq
{
	fn eq (&self, other: &Self) -> bool
	{
		match (self, other)
		{
			(Self::Success (left), Self::Success (right)) => left == right,
			(
				Self::Timeout {partial: left, ..},
				Self::Timeout {partial: right, ..}
			) => left == right,
			(
				Self::Cancelled {partial: left, reason: left_reason, ..},
				Self::Cancelled {partial: right, reason: right_reason, ..}
			) => left == right && left_reason == right_reason,
			(Self::Error (left), Self::Error (right)) =>
				left . message () == right . message (),
			(Self::Empty (left), Self::Empty (right)) => left == right,
			_ => false
		}
	}
}

impl <V> fmt::Display for Outcome <V>
where V: fmt::Debug
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			Self::Success (values) => write! (f, "success {:?}", values),
			Self::Timeout {partial, elapsed} =>
			{
				write! (f, "timeout after {}", elapsed)?;
				match partial
				{
					Some (partial) => write! (f, " (partial: {})", partial),
					None => Ok (())
				}
			}
			Self::Cancelled {partial, elapsed, reason} =>
			{
				write! (f, "cancelled after {}: {}", elapsed, reason)?;
				match partial
				{
					Some (partial) => write! (f, " (partial: {})", partial),
					None => Ok (())
				}
			}
			Self::Error (failure) => write! (f, "error: {}", failure),
			Self::Empty (unavailable) => write! (f, "no value: {}", unavailable)
		}
	}
}

#[cfg (test)]
mod tests
{
	use std::time::Duration;

	use super::*;

	fn timeout_with (partial: Outcome <&'static str>) -> Outcome <&'static str>
	{
		Outcome::Timeout
		{
			partial: Some (Box::new (partial)),
			elapsed: Elapsed::new (Duration::from_secs (2), Duration::from_secs (10))
		}
	}

	#[test]
	fn accessors_only_see_successful_values ()
	{
		let success = Outcome::many (["Hello", "there"]);
		assert_eq! (success . count (), 2);
		assert_eq! (success . or_none (), Some ("Hello"));
		assert_eq! (success . filter (), FilterState::Kept);

		let timeout = timeout_with (Outcome::one ("Hello"));
		assert_eq! (timeout . count (), 0);
		assert! (! timeout . has_value ());
		assert_eq! (timeout . or_default ("fallback"), "fallback");
		assert_eq! (timeout . filter (), FilterState::Discarded);
		assert_eq! (timeout . partial (), Some (&Outcome::one ("Hello")));
	}

	#[test]
	fn equality_ignores_elapsed_time ()
	{
		let quick = timeout_with (Outcome::one ("Hello"));
		let slow = Outcome::Timeout
		{
			partial: Some (Box::new (Outcome::one ("Hello"))),
			elapsed: Elapsed::new (Duration::from_secs (9), Duration::from_secs (10))
		};

		assert_eq! (quick, slow);
		assert_ne! (quick, timeout_with (Outcome::one ("there")));
	}

	#[test]
	fn or_fail_explains_why_there_is_no_value ()
	{
		let timeout = timeout_with (Outcome::one ("Hello"));
		let failure = timeout . or_fail () . unwrap_err ();

		assert! (failure . message () . starts_with ("timed out after 2.000 seconds"));
		assert_eq! (failure . elapsed () . map (|elapsed| elapsed . ceiling ()), Some (Duration::from_secs (10)));

		let empty: Outcome <u8> = Outcome::Empty (Unavailable::new ("still working"));
		assert_eq! (empty . or_fail () . unwrap_err () . message (), "still working");
	}

	#[test]
	fn map_reaches_into_partial_snapshots ()
	{
		let timeout = timeout_with (Outcome::many (["a", "bb"]));
		let lengths = timeout . map (str::len);

		assert_eq! (lengths . partial (), Some (&Outcome::many ([1, 2])));
	}
}
