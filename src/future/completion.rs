use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::FusedFuture;
use parking_lot::Mutex;
use pin_project::pin_project;
use tokio::sync::oneshot::{Receiver, Sender};

use crate::outcome::{Failure, Outcome};
use crate::pending::{PendingResult, Subscriber, SubscriptionId};

// Unsubscribes when the async side stops listening.
pub struct SubscriptionGuard <V>
{
	pending: PendingResult <V>,
	id: SubscriptionId
}

impl <V> SubscriptionGuard <V>
{
	pub (super) fn new (pending: PendingResult <V>, id: SubscriptionId) -> Self
	{
		Self {pending, id}
	}
}

impl <V> Drop for SubscriptionGuard <V>
{
	fn drop (&mut self)
	{
		self . pending . unsubscribe (self . id);
	}
}

pub (super) struct Deliver <V>
{
	sender: Mutex <Option <Sender <Outcome <V>>>>
}

impl <V> Deliver <V>
{
	pub (super) fn new (sender: Sender <Outcome <V>>) -> Self
	{
		Self {sender: Mutex::new (Some (sender))}
	}
}

impl <V> Subscriber <V> for Deliver <V>
where V: Clone + Send
{
	fn completed (&self, outcome: &Outcome <V>)
	{
		let sender = self . sender . lock () . take ();

		if let Some (sender) = sender
		{
			let _ = sender . send (outcome . clone ());
		}
	}
}

/// Resolves to the final outcome of a `BlockingFuture` without blocking a
/// thread. Dropping it before it resolves withdraws its subscription.
#[pin_project (project = CompletionProjection)]
pub enum Completion <V>
{
	Waiting
	{
		#[pin] receiver: Receiver <Outcome <V>>,
		_guard: SubscriptionGuard <V>
	},
	Finished
}

impl <V> Completion <V>
{
	pub (super) fn new (receiver: Receiver <Outcome <V>>, guard: SubscriptionGuard <V>)
	-> Self
	{
		Self::Waiting {receiver, _guard: guard}
	}
}

impl <V> Future for Completion <V>
{
	type Output = Outcome <V>;

	fn poll (mut self: Pin <&mut Self>, cx: &mut Context)
	-> Poll <<Self as Future>::Output>
	{
		match self . as_mut () . project ()
		{
			CompletionProjection::Waiting {receiver, ..} => match receiver . poll (cx)
			{
				Poll::Pending => Poll::Pending,
				Poll::Ready (delivered) =>
				{
					self . set (Self::Finished);

					Poll::Ready
					(
						delivered . unwrap_or_else
						(
							|_| Outcome::Error
							(
								Failure::new ("result was dropped before it completed")
							)
						)
					)
				}
			},
			CompletionProjection::Finished =>
				panic! ("completion was polled after output was taken")
		}
	}
}

impl <V> FusedFuture for Completion <V>
{
	fn is_terminated (&self) -> bool
	{
		match self
		{
			Self::Waiting {..} => false,
			Self::Finished => true
		}
	}
}
