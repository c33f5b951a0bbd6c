//! Opaque token values: redacted wrapper plus CSPRNG generation.

// std
use std::borrow::Borrow;
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

// 48 alphanumeric characters carry ~285 bits of entropy; collisions are negligible
// and the storage layer still enforces uniqueness as a backstop.
const TOKEN_VALUE_LEN: usize = 48;

/// Opaque, unguessable token value keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenValue(String);
impl TokenValue {
	/// Generates a fresh value from a cryptographically strong random source.
	pub fn generate() -> Self {
		Self(rand::rng().sample_iter(Alphanumeric).take(TOKEN_VALUE_LEN).map(char::from).collect())
	}

	/// Wraps an existing value string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenValue {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Borrow<str> for TokenValue {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenValue").field(&"<redacted>").finish()
	}
}
impl Display for TokenValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
