use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use pin_project::pin_project;
use tokio::sync::watch::Sender;
use tokio_stream::wrappers::WatchStream;

use crate::outcome::Outcome;
use crate::pending::Subscriber;

use super::completion::SubscriptionGuard;

pub (super) struct Feed <V>
{
	sender: Mutex <Option <Sender <Option <Outcome <V>>>>>
}

impl <V> Feed <V>
{
	pub (super) fn new (sender: Sender <Option <Outcome <V>>>) -> Self
	{
		Self {sender: Mutex::new (Some (sender))}
	}

	// Seeds the stream with the partial value that was current when it
	// was opened, unless a newer one already arrived.
	pub (super) fn seed (&self, partial: Outcome <V>)
	{
		if let Some (sender) = &*self . sender . lock ()
		{
			sender . send_if_modified
			(
				|current|
				{
					if current . is_some ()
					{
						return false;
					}

					*current = Some (partial);
					true
				}
			);
		}
	}
}

impl <V> Subscriber <V> for Feed <V>
where V: Clone + Send + Sync
{
	fn completed (&self, outcome: &Outcome <V>)
	{
		let sender = self . sender . lock () . take ();

		// Dropping the sender after the last value ends the stream.
		if let Some (sender) = sender
		{
			sender . send_replace (Some (outcome . clone ()));
		}
	}

	fn wants_progress (&self) -> bool
	{
		true
	}

	fn progress (&self, partial: &Outcome <V>)
	{
		if let Some (sender) = &*self . sender . lock ()
		{
			sender . send_replace (Some (partial . clone ()));
		}
	}
}

/// The partial outcomes of a `BlockingFuture` as they are published,
/// followed by its final outcome.
///
/// Like any watch, a slow reader sees only the latest partial value, never
/// a backlog.
#[pin_project]
pub struct Progress <V>
{
	#[pin] updates: WatchStream <Option <Outcome <V>>>,
	_guard: SubscriptionGuard <V>
}

impl <V> Progress <V>
where V: Clone + Send + Sync + 'static
{
	pub (super) fn new
	(
		updates: WatchStream <Option <Outcome <V>>>,
		guard: SubscriptionGuard <V>
	)
	-> Self
	{
		Self {updates, _guard: guard}
	}
}

impl <V> Stream for Progress <V>
where V: Clone + Send + Sync + 'static
{
	type Item = Outcome <V>;

	fn poll_next (self: Pin <&mut Self>, cx: &mut Context)
	-> Poll <Option <Self::Item>>
	{
		let mut updates = self . project () . updates;

		loop
		{
			match updates . as_mut () . poll_next (cx)
			{
				Poll::Pending => return Poll::Pending,
				Poll::Ready (None) => return Poll::Ready (None),
				Poll::Ready (Some (None)) => continue,
				Poll::Ready (Some (Some (outcome))) => return Poll::Ready (Some (outcome))
			}
		}
	}
}
