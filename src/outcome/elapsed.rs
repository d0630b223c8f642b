use std::fmt;
use std::time::{Duration, Instant};

#[derive (Copy, Clone, Debug, PartialEq, Eq)]
pub struct Elapsed
{
	elapsed: Duration,
	ceiling: Duration
}

impl Elapsed
{
	pub fn new (elapsed: Duration, ceiling: Duration) -> Self
	{
		Self {elapsed, ceiling}
	}

	pub fn since (start: Instant, ceiling: Duration) -> Self
	{
		Self::new (start . elapsed (), ceiling)
	}

	pub fn elapsed (&self) -> Duration
	{
		self . elapsed
	}

	pub fn ceiling (&self) -> Duration
	{
		self . ceiling
	}

	pub fn exceeded_ceiling (&self) -> bool
	{
		self . elapsed >= self . ceiling
	}
}

impl fmt::Display for Elapsed
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write!
		(
			f,
			"{:.3} seconds (ceiling {:.3} seconds)",
			self . elapsed . as_secs_f64 (),
			self . ceiling . as_secs_f64 ()
		)
	}
}

#[cfg (test)]
mod tests
{
	use super::*;

	#[test]
	fn exceeded_ceiling_is_inclusive ()
	{
		let ceiling = Duration::from_millis (200);

		assert! (Elapsed::new (ceiling, ceiling) . exceeded_ceiling ());
		assert! (! Elapsed::new (Duration::from_millis (199), ceiling) . exceeded_ceiling ());
	}

	#[test]
	fn display_reports_seconds ()
	{
		let elapsed = Elapsed::new
		(
			Duration::from_millis (1500),
			Duration::from_secs (10)
		);

		assert_eq!
		(
			elapsed . to_string (),
			"1.500 seconds (ceiling 10.000 seconds)"
		);
	}
}
