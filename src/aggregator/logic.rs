use crate::outcome::Outcome;

// How strongly an outcome claims the folded result when neither side
// decides it outright.
fn weight <V> (outcome: &Outcome <V>) -> u8
{
	match outcome
	{
		Outcome::Success (_) => 0,
		Outcome::Empty (_) => 1,
		Outcome::Timeout {..} => 2,
		Outcome::Cancelled {..} => 3,
		Outcome::Error (_) => 4
	}
}

fn contains (outcome: &Outcome <bool>, wanted: bool) -> bool
{
	outcome . values () . contains (&wanted)
}

fn reduce (accumulator: &Outcome <bool>, next: &Outcome <bool>, decisive: bool)
-> Outcome <bool>
{
	if contains (accumulator, decisive) || contains (next, decisive)
	{
		return Outcome::one (decisive);
	}

	if accumulator . is_success () && next . is_success ()
	{
		return Outcome::one (! decisive);
	}

	if weight (next) > weight (accumulator)
	{
		next . clone ()
	}
	else
	{
		accumulator . clone ()
	}
}

/// Logical AND. A `false` anywhere decides the result; otherwise the
/// strongest non-success outcome wins (error, then cancelled, then
/// timeout, then empty).
pub fn and (accumulator: &Outcome <bool>, next: &Outcome <bool>) -> Outcome <bool>
{
	reduce (accumulator, next, false)
}

/// Logical OR. A `true` anywhere decides the result; otherwise as `and`.
pub fn or (accumulator: &Outcome <bool>, next: &Outcome <bool>) -> Outcome <bool>
{
	reduce (accumulator, next, true)
}

#[cfg (test)]
mod tests
{
	use std::time::Duration;

	use crate::outcome::{Elapsed, Failure};

	use super::*;

	fn timeout () -> Outcome <bool>
	{
		Outcome::Timeout
		{
			partial: None,
			elapsed: Elapsed::new (Duration::from_millis (10), Duration::from_millis (10))
		}
	}

	#[test]
	fn and_of_successes ()
	{
		assert_eq! (and (&Outcome::one (true), &Outcome::one (true)), Outcome::one (true));
		assert_eq! (and (&Outcome::one (true), &Outcome::one (false)), Outcome::one (false));
		assert_eq! (and (&Outcome::many ([true, true]), &Outcome::one (true)), Outcome::one (true));
	}

	#[test]
	fn or_of_successes ()
	{
		assert_eq! (or (&Outcome::one (false), &Outcome::one (false)), Outcome::one (false));
		assert_eq! (or (&Outcome::one (false), &Outcome::one (true)), Outcome::one (true));
	}

	#[test]
	fn decisive_values_beat_failures ()
	{
		let error = Outcome::Error (Failure::new ("child failed"));

		assert_eq! (and (&error, &Outcome::one (false)), Outcome::one (false));
		assert_eq! (or (&timeout (), &Outcome::one (true)), Outcome::one (true));
	}

	#[test]
	fn strongest_failure_wins_in_either_order ()
	{
		let error = Outcome::Error (Failure::new ("child failed"));

		assert_eq! (and (&timeout (), &error), error);
		assert_eq! (and (&error, &timeout ()), error);
		assert_eq! (and (&Outcome::one (true), &timeout ()), timeout ());
		assert_eq! (or (&timeout (), &Outcome::one (false)), timeout ());
	}
}
