use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

use super::{Elapsed, Unavailable};

#[derive (Clone, Debug, Error)]
#[error ("{message}")]
pub struct Failure
{
	message: String,
	elapsed: Option <Elapsed>,
	#[source]
	source: Option <Arc <dyn Error + Send + Sync>>
}

impl Failure
{
	pub fn new (message: impl Into <String>) -> Self
	{
		Self {message: message . into (), elapsed: None, source: None}
	}

	pub fn with_elapsed (mut self, elapsed: Elapsed) -> Self
	{
		self . elapsed = Some (elapsed);
		self
	}

	pub fn with_source <E> (self, source: E) -> Self
	where E: Error + Send + Sync + 'static
	{
		self . with_shared_source (Arc::new (source))
	}

	pub fn with_shared_source (mut self, source: Arc <dyn Error + Send + Sync>)
	-> Self
	{
		self . source = Some (source);
		self
	}

	pub fn message (&self) -> &str
	{
		&self . message
	}

	pub fn elapsed (&self) -> Option <Elapsed>
	{
		self . elapsed
	}

	pub fn cause (&self) -> Option <&Arc <dyn Error + Send + Sync>>
	{
		self . source . as_ref ()
	}
}

impl From <Unavailable> for Failure
{
	fn from (unavailable: Unavailable) -> Self
	{
		Self::new (unavailable . reason () . to_owned ()) . with_source (unavailable)
	}
}

#[derive (Clone, Debug, PartialEq, Eq, Error)]
#[error ("worker panicked: {message}")]
pub struct WorkerPanic
{
	message: String
}

impl WorkerPanic
{
	pub fn new (message: impl Into <String>) -> Self
	{
		Self {message: message . into ()}
	}

	pub fn from_payload (payload: &(dyn Any + Send)) -> Self
	{
		if let Some (message) = payload . downcast_ref::<&'static str> ()
		{
			Self::new (*message)
		}
		else if let Some (message) = payload . downcast_ref::<String> ()
		{
			Self::new (message . clone ())
		}
		else
		{
			Self::new ("non-string panic payload")
		}
	}

	pub fn message (&self) -> &str
	{
		&self . message
	}
}

#[cfg (test)]
mod tests
{
	use super::*;

	#[test]
	fn panic_payloads_keep_their_message ()
	{
		let payload = std::panic::catch_unwind (|| panic! ("disk on fire"))
			. unwrap_err ();

		assert_eq! (WorkerPanic::from_payload (&*payload) . message (), "disk on fire");

		let payload: Box <dyn Any + Send> = Box::new (format! ("code {}", 7));
		assert_eq! (WorkerPanic::from_payload (&*payload) . message (), "code 7");

		let payload: Box <dyn Any + Send> = Box::new (7_u32);
		assert_eq!
		(
			WorkerPanic::from_payload (&*payload) . message (),
			"non-string panic payload"
		);
	}

	#[test]
	fn failure_exposes_its_source ()
	{
		let failure = Failure::new ("worker failed")
			. with_source (WorkerPanic::new ("boom"));

		let source = failure . source () . map (|source| source . to_string ());
		assert_eq! (source . as_deref (), Some ("worker panicked: boom"));
	}

	#[test]
	fn unavailable_converts_into_failure ()
	{
		let failure = Failure::from (Unavailable::new ("not yet"));

		assert_eq! (failure . message (), "not yet");
		assert! (failure . cause () . is_some ());
	}
}
