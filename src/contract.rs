use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive (Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ViolationKind
{
	MustBeGreaterThanZero,
	MustNotBeEmpty
}

impl fmt::Display for ViolationKind
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			Self::MustBeGreaterThanZero => f . write_str ("must be greater than zero"),
			Self::MustNotBeEmpty => f . write_str ("must not be empty")
		}
	}
}

/// A malformed call, rejected at the call site rather than stored as an
/// outcome.
#[derive (Clone, Debug, PartialEq, Eq, Error)]
#[error ("{plaintiff} {kind} (got {value})")]
pub struct PreconditionViolation
{
	pub kind: ViolationKind,
	pub plaintiff: &'static str,
	pub value: String
}

impl PreconditionViolation
{
	pub fn new (kind: ViolationKind, plaintiff: &'static str, value: impl fmt::Debug)
	-> Self
	{
		Self {kind, plaintiff, value: format! ("{:?}", value)}
	}
}

pub fn must_be_greater_than_zero (plaintiff: &'static str, duration: Duration)
-> Result <Duration, PreconditionViolation>
{
	if duration . is_zero ()
	{
		Err
		(
			PreconditionViolation::new
			(
				ViolationKind::MustBeGreaterThanZero,
				plaintiff,
				duration
			)
		)
	}
	else
	{
		Ok (duration)
	}
}

pub fn must_not_be_empty <T> (plaintiff: &'static str, items: &[T])
-> Result <(), PreconditionViolation>
{
	if items . is_empty ()
	{
		Err
		(
			PreconditionViolation::new
			(
				ViolationKind::MustNotBeEmpty,
				plaintiff,
				items . len ()
			)
		)
	}
	else
	{
		Ok (())
	}
}

#[cfg (test)]
mod tests
{
	use super::*;

	#[test]
	fn zero_duration_is_rejected ()
	{
		let violation = must_be_greater_than_zero ("max_timeout", Duration::ZERO)
			. unwrap_err ();

		assert_eq! (violation . kind, ViolationKind::MustBeGreaterThanZero);
		assert_eq! (violation . to_string (), "max_timeout must be greater than zero (got 0ns)");

		assert_eq!
		(
			must_be_greater_than_zero ("max_timeout", Duration::from_nanos (1)),
			Ok (Duration::from_nanos (1))
		);
	}

	#[test]
	fn empty_slices_are_rejected ()
	{
		let violation = must_not_be_empty::<u8> ("children", &[]) . unwrap_err ();

		assert_eq! (violation . kind, ViolationKind::MustNotBeEmpty);
		assert_eq! (violation . plaintiff, "children");
		assert! (must_not_be_empty ("children", &[1]) . is_ok ());
	}
}
