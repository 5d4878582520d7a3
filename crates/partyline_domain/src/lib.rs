#![forbid(unsafe_code)]

use core::fmt;

use serde::{Deserialize, Serialize};

/// Client-supplied username used as the routing key.
///
/// Identities are opaque and unvalidated: the relay trusts the claimed name
/// and uses it verbatim as a map key and in outbound frames.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}

impl fmt::Display for Username {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for Username {
	fn from(name: String) -> Self {
		Self(name)
	}
}

impl From<&str> for Username {
	fn from(name: &str) -> Self {
		Self(name.to_string())
	}
}
