use crate::outcome::Outcome;

/// Turns a parent future's outcome into a derived future's outcome.
///
/// Plain closures are operations that only see the final outcome. An
/// operation that also wants to follow the parent's partial results
/// returns `true` from `is_progressive`; `Progressive` does this for a
/// closure.
pub trait Operation <V, O>: Send + Sync
{
	fn apply (&self, outcome: &Outcome <V>) -> Outcome <O>;

	fn is_progressive (&self) -> bool
	{
		false
	}

	fn progress (&self, _partial: &Outcome <V>) -> Option <Outcome <O>>
	{
		None
	}
}

impl <V, O, F> Operation <V, O> for F
where F: Fn (&Outcome <V>) -> Outcome <O> + Send + Sync
{
	fn apply (&self, outcome: &Outcome <V>) -> Outcome <O>
	{
		self (outcome)
	}
}

/// Applies the same closure to partial and final outcomes alike.
pub struct Progressive <F> (pub F);

impl <V, O, F> Operation <V, O> for Progressive <F>
where F: Fn (&Outcome <V>) -> Outcome <O> + Send + Sync
{
	fn apply (&self, outcome: &Outcome <V>) -> Outcome <O>
	{
		(self . 0) (outcome)
	}

	fn is_progressive (&self) -> bool
	{
		true
	}

	fn progress (&self, partial: &Outcome <V>) -> Option <Outcome <O>>
	{
		Some ((self . 0) (partial))
	}
}
