use std::fmt;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new (0);

#[derive (Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FutureId (u64);

impl FutureId
{
	fn next () -> Self
	{
		Self (NEXT_FUTURE_ID . fetch_add (1, Ordering::Relaxed))
	}
}

impl fmt::Display for FutureId
{
	fn fmt (&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write! (f, "future#{}", self . 0)
	}
}

// Where a future came from. The parent link is weak: provenance is for
// diagnostics and must never keep a finished parent alive.
pub (crate) struct Provenance
{
	id: FutureId,
	parent: Option <Weak <Provenance>>
}

impl Provenance
{
	pub (crate) fn root () -> Arc <Self>
	{
		Arc::new (Self {id: FutureId::next (), parent: None})
	}

	pub (crate) fn derived (parent: &Arc <Self>) -> Arc <Self>
	{
		Arc::new (Self {id: FutureId::next (), parent: Some (Arc::downgrade (parent))})
	}

	pub (crate) fn id (&self) -> FutureId
	{
		self . id
	}

	fn parent (&self) -> Option <Arc <Self>>
	{
		self . parent . as_ref () . and_then (Weak::upgrade)
	}

	pub (crate) fn cause (&self) -> FutureId
	{
		self . parent () . map_or (self . id, |parent| parent . id)
	}

	pub (crate) fn cause_root (&self) -> FutureId
	{
		let Some (mut current) = self . parent ()
		else
		{
			return self . id;
		};

		while let Some (parent) = current . parent ()
		{
			current = parent;
		}

		current . id
	}
}

#[cfg (test)]
mod tests
{
	use super::*;

	#[test]
	fn cause_defaults_to_self ()
	{
		let root = Provenance::root ();

		assert_eq! (root . cause (), root . id ());
		assert_eq! (root . cause_root (), root . id ());
	}

	#[test]
	fn cause_chain_walks_to_the_root_while_parents_live ()
	{
		let root = Provenance::root ();
		let middle = Provenance::derived (&root);
		let leaf = Provenance::derived (&middle);

		assert_eq! (leaf . cause (), middle . id ());
		assert_eq! (leaf . cause_root (), root . id ());

		drop (middle);
		assert_eq! (leaf . cause (), leaf . id ());
	}
}
