use std::fmt;

use parking_lot::Mutex;

use crate::outcome::Outcome;

#[derive (Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId (pub (crate) u64);

impl fmt::Display for SubscriptionId
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write! (f, "subscription#{}", self . 0)
	}
}

/// Something waiting on a `PendingResult`.
///
/// `completed` is called at most once, outside the result's lock, so it may
/// call straight back into the result. Subscribers that return `true` from
/// `wants_progress` are also handed every partial outcome published before
/// completion.
pub trait Subscriber <V>: Send + Sync
{
	fn completed (&self, outcome: &Outcome <V>);

	fn wants_progress (&self) -> bool
	{
		false
	}

	fn progress (&self, _partial: &Outcome <V>) {}
}

pub struct OnComplete <F>
{
	callback: Mutex <Option <F>>
}

impl <F> OnComplete <F>
{
	pub fn new (callback: F) -> Self
	{
		Self {callback: Mutex::new (Some (callback))}
	}
}

impl <V, F> Subscriber <V> for OnComplete <F>
where F: FnOnce (&Outcome <V>) + Send
{
	fn completed (&self, outcome: &Outcome <V>)
	{
		let callback = self . callback . lock () . take ();

		if let Some (callback) = callback
		{
			callback (outcome);
		}
	}
}
