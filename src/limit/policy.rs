//! Named rate-limit profiles applied to classes of endpoints.

// self
use crate::_prelude::*;

/// Error returned when policy-class validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum PolicyError {
	/// Policy classes must carry a non-empty name.
	#[error("Policy class name cannot be empty.")]
	EmptyName,
	/// A bucket must be able to hold at least one token.
	#[error("Policy class `{name}` must have a capacity of at least one.")]
	ZeroCapacity {
		/// Name of the offending policy class.
		name: &'static str,
	},
	/// Refill intervals must be strictly positive.
	#[error("Policy class `{name}` must have a positive refill interval.")]
	NonPositiveInterval {
		/// Name of the offending policy class.
		name: &'static str,
	},
}

/// Immutable rate-limiting profile: a bucket capacity plus a refill interval.
///
/// The four built-in constants cover the endpoint classes of a typical
/// authentication surface; [`PolicyClass::new`] builds custom profiles with the
/// same validation the crate applies elsewhere (fail fast on programming errors).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PolicyClass {
	name: &'static str,
	capacity: u32,
	refill_interval: Duration,
}
impl PolicyClass {
	/// Login attempts: 5 requests per 15 minutes.
	pub const AUTH_LOGIN: Self =
		Self { name: "auth-login", capacity: 5, refill_interval: Duration::minutes(15) };
	/// Account registration: 3 requests per hour.
	pub const AUTH_REGISTER: Self =
		Self { name: "auth-register", capacity: 3, refill_interval: Duration::hours(1) };
	/// Everything else: 100 requests per minute.
	pub const GENERAL: Self =
		Self { name: "general", capacity: 100, refill_interval: Duration::minutes(1) };
	/// Forgot-password and reset-password endpoints: 3 requests per hour.
	pub const PASSWORD_RESET: Self =
		Self { name: "password-reset", capacity: 3, refill_interval: Duration::hours(1) };

	/// Creates a custom policy class after validation.
	pub fn new(
		name: &'static str,
		capacity: u32,
		refill_interval: Duration,
	) -> Result<Self, PolicyError> {
		if name.is_empty() {
			return Err(PolicyError::EmptyName);
		}
		if capacity == 0 {
			return Err(PolicyError::ZeroCapacity { name });
		}
		if !refill_interval.is_positive() {
			return Err(PolicyError::NonPositiveInterval { name });
		}

		Ok(Self { name, capacity, refill_interval })
	}

	/// Returns the policy's stable name.
	pub const fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the maximum number of tokens a bucket of this class holds.
	pub const fn capacity(&self) -> u32 {
		self.capacity
	}

	/// Returns the interval after which a bucket refills back to capacity.
	pub const fn refill_interval(&self) -> Duration {
		self.refill_interval
	}
}
impl Display for PolicyClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name)
	}
}
