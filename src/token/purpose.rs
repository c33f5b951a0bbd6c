//! Token purposes and the per-purpose time-to-live policy.

// self
use crate::_prelude::*;

/// Functional category of an ephemeral token, governing its TTL and consumption flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPurpose {
	/// Single-use credential backing a "reset password" flow.
	PasswordReset,
	/// Single-use credential proving ownership of an email address.
	EmailVerification,
	/// Long-lived credential exchanged for a fresh session.
	RefreshSession,
}
impl TokenPurpose {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenPurpose::PasswordReset => "password_reset",
			TokenPurpose::EmailVerification => "email_verification",
			TokenPurpose::RefreshSession => "refresh_session",
		}
	}
}
impl Display for TokenPurpose {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Per-purpose default TTLs.
///
/// These values are policy, not mechanism: the manager accepts any positive TTL per
/// issuance and only falls back to this table when the caller does not supply one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlPolicy {
	/// TTL applied to [`TokenPurpose::PasswordReset`] issuances.
	pub password_reset: Duration,
	/// TTL applied to [`TokenPurpose::EmailVerification`] issuances.
	pub email_verification: Duration,
	/// TTL applied to [`TokenPurpose::RefreshSession`] issuances.
	pub refresh_session: Duration,
}
impl TtlPolicy {
	/// Returns the configured TTL for the provided purpose.
	pub const fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
		match purpose {
			TokenPurpose::PasswordReset => self.password_reset,
			TokenPurpose::EmailVerification => self.email_verification,
			TokenPurpose::RefreshSession => self.refresh_session,
		}
	}
}
impl Default for TtlPolicy {
	fn default() -> Self {
		Self {
			password_reset: Duration::hours(1),
			email_verification: Duration::hours(24),
			refresh_session: Duration::days(7),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_policy_matches_production_values() {
		let policy = TtlPolicy::default();

		assert_eq!(policy.ttl_for(TokenPurpose::PasswordReset), Duration::hours(1));
		assert_eq!(policy.ttl_for(TokenPurpose::EmailVerification), Duration::hours(24));
		assert_eq!(policy.ttl_for(TokenPurpose::RefreshSession), Duration::days(7));
	}

	#[test]
	fn purpose_labels_are_stable() {
		assert_eq!(TokenPurpose::PasswordReset.as_str(), "password_reset");
		assert_eq!(TokenPurpose::EmailVerification.to_string(), "email_verification");
		assert_eq!(TokenPurpose::RefreshSession.as_str(), "refresh_session");
	}
}
