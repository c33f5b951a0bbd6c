//! Admission-filter boundary: maps an inbound request to a policy class and client
//! identity, consults the [`RateLimiter`], and shapes the protocol-level verdict.
//!
//! This layer is transport-agnostic: callers feed it the request path, the
//! forwarded-client header (if any), and the observed peer address, and translate
//! the returned [`AdmissionOutcome`] into their framework's response themselves.

// self
use crate::{
	_prelude::*,
	limit::{AdmitVerdict, PolicyClass, RateLimiter},
	token::ClientKey,
};

/// Response header carrying the remaining token count after an allowed admission.
pub const REMAINING_HEADER: &str = "X-Rate-Limit-Remaining";
/// Response header carrying the retry hint after a rejected admission.
pub const RETRY_AFTER_HEADER: &str = "X-Rate-Limit-Retry-After-Seconds";

/// Ordered path predicates resolving a request path to a policy class.
///
/// First match wins; unmatched paths fall back to the table's default class.
#[derive(Clone, Debug)]
pub struct RouteTable {
	rules: Vec<(String, PolicyClass)>,
	fallback: PolicyClass,
}
impl RouteTable {
	/// Creates an empty table with the provided fallback class.
	pub fn new(fallback: PolicyClass) -> Self {
		Self { rules: Vec::new(), fallback }
	}

	/// The routing used by a typical authentication surface: login, registration,
	/// and the two password-reset paths get their restrictive classes, everything
	/// else the general one.
	pub fn auth_defaults() -> Self {
		Self::new(PolicyClass::GENERAL)
			.route("/auth/login", PolicyClass::AUTH_LOGIN)
			.route("/auth/register", PolicyClass::AUTH_REGISTER)
			.route("/forgot-password", PolicyClass::PASSWORD_RESET)
			.route("/reset-password", PolicyClass::PASSWORD_RESET)
	}

	/// Appends a rule matching any path that contains `needle`.
	pub fn route(mut self, needle: impl Into<String>, policy: PolicyClass) -> Self {
		self.rules.push((needle.into(), policy));

		self
	}

	/// Resolves the policy class for a request path.
	pub fn resolve(&self, path: &str) -> PolicyClass {
		self.rules
			.iter()
			.find(|(needle, _)| path.contains(needle.as_str()))
			.map(|(_, policy)| *policy)
			.unwrap_or(self.fallback)
	}
}

/// Derives the client identity a bucket is keyed on.
///
/// The first entry of the forwarded-client header wins when present and usable;
/// otherwise the directly observed peer address; otherwise a fixed fallback key so
/// the check itself never fails.
pub fn derive_client_key(forwarded_for: Option<&str>, peer_addr: &str) -> ClientKey {
	if let Some(header) = forwarded_for {
		let first = header.split(',').next().unwrap_or_default().trim();

		if let Ok(key) = ClientKey::new(first) {
			return key;
		}
	}

	ClientKey::new(peer_addr.trim()).unwrap_or_else(|_| ClientKey::unknown())
}

/// JSON body returned alongside an HTTP 429 when an admission is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRejection {
	/// Short error label.
	pub error: String,
	/// Human-readable message including the retry hint.
	pub message: String,
	/// Whole seconds until the next full refill.
	#[serde(rename = "retryAfter")]
	pub retry_after: u64,
}
impl RateLimitRejection {
	/// Builds the canonical rejection body for the provided retry hint.
	pub fn new(retry_after_secs: u64) -> Self {
		Self {
			error: "Too many requests".into(),
			message: format!("Rate limit exceeded. Try again in {retry_after_secs} seconds"),
			retry_after: retry_after_secs,
		}
	}

	/// Serializes the body to its JSON wire form.
	pub fn to_json(&self) -> String {
		// Serialization of this struct cannot fail; fall back to a static body anyway.
		serde_json::to_string(self).unwrap_or_else(|_| "{\"error\":\"Too many requests\"}".into())
	}
}

/// Verdict shaped for the protocol layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
	/// Forward the request; attach [`REMAINING_HEADER`].
	Admitted {
		/// Tokens left in the bucket after this admission.
		remaining: u32,
	},
	/// Respond with HTTP 429, the rejection body, and [`RETRY_AFTER_HEADER`].
	Rejected {
		/// Whole seconds until the next full refill.
		retry_after_secs: u64,
		/// Canonical JSON body for the response.
		rejection: RateLimitRejection,
	},
}

/// Thin composing layer gluing the route table, key derivation, and limiter together.
#[derive(Debug)]
pub struct AdmissionFilter {
	limiter: RateLimiter,
	routes: RouteTable,
}
impl AdmissionFilter {
	/// Creates a filter with a fresh limiter and the provided route table.
	pub fn new(routes: RouteTable) -> Self {
		Self { limiter: RateLimiter::new(), routes }
	}

	/// Checks one inbound request at the current UTC instant.
	pub fn check(
		&self,
		path: &str,
		forwarded_for: Option<&str>,
		peer_addr: &str,
	) -> AdmissionOutcome {
		self.check_at(path, forwarded_for, peer_addr, OffsetDateTime::now_utc())
	}

	/// Check variant taking an explicit instant (deterministic in tests).
	pub fn check_at(
		&self,
		path: &str,
		forwarded_for: Option<&str>,
		peer_addr: &str,
		now: OffsetDateTime,
	) -> AdmissionOutcome {
		let policy = self.routes.resolve(path);
		let client = derive_client_key(forwarded_for, peer_addr);

		match self.limiter.admit_at(&policy, &client, now) {
			AdmitVerdict::Allowed { remaining } => AdmissionOutcome::Admitted { remaining },
			AdmitVerdict::Rejected { retry_after_secs } => AdmissionOutcome::Rejected {
				retry_after_secs,
				rejection: RateLimitRejection::new(retry_after_secs),
			},
		}
	}

	/// Access to the underlying limiter for resets and idle-bucket eviction.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn routes_resolve_in_declaration_order() {
		let routes = RouteTable::auth_defaults();

		assert_eq!(routes.resolve("/api/auth/login"), PolicyClass::AUTH_LOGIN);
		assert_eq!(routes.resolve("/api/auth/register"), PolicyClass::AUTH_REGISTER);
		assert_eq!(routes.resolve("/api/auth/forgot-password"), PolicyClass::PASSWORD_RESET);
		assert_eq!(routes.resolve("/api/auth/reset-password"), PolicyClass::PASSWORD_RESET);
		assert_eq!(routes.resolve("/api/users/me"), PolicyClass::GENERAL);
	}

	#[test]
	fn forwarded_header_takes_precedence_over_peer() {
		let key = derive_client_key(Some("203.0.113.7, 10.0.0.1"), "192.0.2.50");

		assert_eq!(key.as_ref(), "203.0.113.7");

		let key = derive_client_key(None, "192.0.2.50");

		assert_eq!(key.as_ref(), "192.0.2.50");

		// An unusable header falls back to the peer; an unusable peer to the fixed key.
		let key = derive_client_key(Some(""), "192.0.2.50");

		assert_eq!(key.as_ref(), "192.0.2.50");

		let key = derive_client_key(None, "");

		assert_eq!(key, ClientKey::unknown());
	}

	#[test]
	fn rejection_body_matches_the_wire_format() {
		let rejection = RateLimitRejection::new(42);

		assert_eq!(
			rejection.to_json(),
			"{\"error\":\"Too many requests\",\"message\":\"Rate limit exceeded. \
			 Try again in 42 seconds\",\"retryAfter\":42}",
		);
	}

	#[test]
	fn filter_admits_then_rejects_with_retry_hint() {
		let filter = AdmissionFilter::new(RouteTable::auth_defaults());
		let now = macros::datetime!(2025-06-01 00:00 UTC);

		for expected_remaining in (0..PolicyClass::AUTH_LOGIN.capacity()).rev() {
			assert_eq!(
				filter.check_at("/api/auth/login", None, "198.51.100.9", now),
				AdmissionOutcome::Admitted { remaining: expected_remaining },
			);
		}

		let outcome = filter.check_at("/api/auth/login", None, "198.51.100.9", now);
		let AdmissionOutcome::Rejected { retry_after_secs, rejection } = outcome else {
			panic!("Exhausted bucket should reject.");
		};

		assert_eq!(retry_after_secs, 900);
		assert_eq!(rejection.retry_after, 900);
	}
}
