//! Crate-level error types shared across the rate limiter, stores, and the token manager.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Rate-limit denial is deliberately absent here: a rejected admission is an expected
/// outcome carried as data ([`crate::limit::AdmitVerdict::Rejected`]), never an error.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or integration problem; fail fast, never silently default.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// User-correctable token outcome; callers map each variant to its own message.
	#[error(transparent)]
	Token(#[from] TokenError),
}

/// User-correctable consumption failures.
///
/// The three kinds are distinguished because business flows report different
/// user-facing messages for each; none of them is process-fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenError {
	/// No token with the presented value and purpose exists.
	#[error("Token was not found.")]
	NotFound,
	/// The token exists but has already been consumed.
	#[error("Token has already been used.")]
	AlreadyUsed,
	/// The token exists but its expiry instant has passed.
	#[error("Token has expired.")]
	Expired,
}

/// Configuration and validation failures raised by the crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ConfigError {
	/// A token time-to-live must be strictly positive.
	#[error("Token time-to-live must be positive.")]
	NonPositiveTtl,
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::token::IdentifierError),
	/// Rate-limit policy class validation failed.
	#[error(transparent)]
	Policy(#[from] crate::limit::PolicyError),
}
impl From<crate::token::IdentifierError> for Error {
	fn from(e: crate::token::IdentifierError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::limit::PolicyError> for Error {
	fn from(e: crate::limit::PolicyError) -> Self {
		Self::Config(e.into())
	}
}
