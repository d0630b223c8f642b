use std::borrow::Cow;

use thiserror::Error;

#[derive (Clone, Debug, PartialEq, Eq, Error)]
#[error ("{reason}")]
pub struct Unavailable
{
	reason: Cow <'static, str>
}

impl Unavailable
{
	pub fn new (reason: impl Into <Cow <'static, str>>) -> Self
	{
		Self {reason: reason . into ()}
	}

	pub fn still_blocking () -> Self
	{
		Self::new ("value is not available: the result is still blocking")
	}

	pub fn reason (&self) -> &str
	{
		&self . reason
	}
}

impl Default for Unavailable
{
	fn default () -> Self
	{
		Self::still_blocking ()
	}
}
