//! Ephemeral token records and lifecycle state helpers.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	token::{SubjectId, TokenPurpose, TokenValue},
};

/// Lifecycle state of a token record at a given instant.
///
/// Transitions are monotonic: a record never returns to [`TokenState::Active`]
/// once used or expired, and both `Used` and `Expired` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
	/// The token may still be validated or consumed.
	Active,
	/// The token has been consumed exactly once.
	Used,
	/// The token's expiry instant has passed.
	Expired,
}

/// Single-use, time-bounded credential linking a subject to a purpose.
///
/// The subject is referenced by identifier only; the record never owns account data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Opaque unguessable value, globally unique across all purposes.
	pub value: TokenValue,
	/// Subject the token was issued on behalf of.
	pub subject: SubjectId,
	/// Functional category governing TTL and consumption semantics.
	pub purpose: TokenPurpose,
	/// Instant the token was issued.
	pub issued_at: OffsetDateTime,
	/// Instant past which the token is expired.
	pub expires_at: OffsetDateTime,
	/// Consumption instant, if the token has been used.
	pub used_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Creates a fresh record expiring `ttl` after `issued_at`.
	///
	/// A non-positive TTL is a programming error and fails fast.
	pub fn issue(
		value: TokenValue,
		subject: SubjectId,
		purpose: TokenPurpose,
		issued_at: OffsetDateTime,
		ttl: Duration,
	) -> Result<Self, ConfigError> {
		if !ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl);
		}

		Ok(Self { value, subject, purpose, issued_at, expires_at: issued_at + ttl, used_at: None })
	}

	/// Computes the lifecycle state at a given instant.
	///
	/// Consumption wins over expiry so that a used-then-expired token still reports
	/// `Used`, matching the order business flows check in.
	pub fn state_at(&self, instant: OffsetDateTime) -> TokenState {
		if self.used_at.is_some() {
			return TokenState::Used;
		}
		if instant >= self.expires_at {
			return TokenState::Expired;
		}

		TokenState::Active
	}

	/// Convenience helper that checks the state using the current UTC instant.
	pub fn state(&self) -> TokenState {
		self.state_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record is active at the provided instant.
	pub fn is_active_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.state_at(instant), TokenState::Active)
	}

	/// Returns `true` if the record is expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.state_at(instant), TokenState::Expired)
	}

	/// Returns `true` if the record has been consumed.
	pub fn is_used(&self) -> bool {
		self.used_at.is_some()
	}

	/// Marks the record as consumed at the provided instant.
	pub fn mark_used(&mut self, instant: OffsetDateTime) {
		self.used_at = Some(instant);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn build_record(issued: OffsetDateTime, ttl: Duration) -> TokenRecord {
		TokenRecord::issue(
			TokenValue::new("fixture-value"),
			SubjectId::new("user-7").expect("Subject fixture should be valid."),
			TokenPurpose::PasswordReset,
			issued,
			ttl,
		)
		.expect("Record fixture should build successfully.")
	}

	#[test]
	fn state_transitions_cover_all_states() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let mut record = build_record(issued, Duration::hours(1));

		assert_eq!(record.state_at(macros::datetime!(2025-01-01 00:30 UTC)), TokenState::Active);
		assert_eq!(record.state_at(macros::datetime!(2025-01-01 01:00 UTC)), TokenState::Expired);

		record.mark_used(macros::datetime!(2025-01-01 00:40 UTC));

		assert_eq!(record.state_at(macros::datetime!(2025-01-01 00:45 UTC)), TokenState::Used);
	}

	#[test]
	fn used_wins_over_expiry() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let mut record = build_record(issued, Duration::minutes(10));

		record.mark_used(macros::datetime!(2025-01-01 00:05 UTC));

		// Hours past expiry the record still reports consumption, not expiry.
		assert_eq!(record.state_at(macros::datetime!(2025-01-01 06:00 UTC)), TokenState::Used);
	}

	#[test]
	fn non_positive_ttl_fails_fast() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let build = |ttl| {
			TokenRecord::issue(
				TokenValue::new("fixture-value"),
				SubjectId::new("user-7").expect("Subject fixture should be valid."),
				TokenPurpose::RefreshSession,
				issued,
				ttl,
			)
		};

		assert_eq!(build(Duration::ZERO), Err(ConfigError::NonPositiveTtl));
		assert_eq!(build(Duration::seconds(-1)), Err(ConfigError::NonPositiveTtl));
	}

	#[test]
	fn expiry_boundary_is_exclusive() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let record = build_record(issued, Duration::minutes(30));
		let boundary = macros::datetime!(2025-01-01 00:30 UTC);

		assert!(record.is_active_at(boundary - Duration::nanoseconds(1)));
		assert!(record.is_expired_at(boundary));
	}
}
