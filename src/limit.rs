//! Per-client token-bucket rate limiting with lazy intervally refill.

pub mod policy;

mod bucket;

pub use policy::*;

// self
use crate::{
	_prelude::*,
	limit::bucket::Bucket,
	obs::{self, OpKind, OpOutcome, OpSpan},
	token::ClientKey,
};

/// Outcome of an admission check.
///
/// A rejection is an expected outcome, not an error; its only externally visible
/// effect is the retry-after hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmitVerdict {
	/// The request may proceed; one token was consumed.
	Allowed {
		/// Tokens left in the bucket after this admission.
		remaining: u32,
	},
	/// The bucket is empty for the rest of the current interval.
	Rejected {
		/// Whole seconds until the next full refill.
		retry_after_secs: u64,
	},
}
impl AdmitVerdict {
	/// Returns `true` if the request was admitted.
	pub const fn is_allowed(&self) -> bool {
		matches!(self, AdmitVerdict::Allowed { .. })
	}

	/// Tokens remaining after an allowed admission.
	pub const fn remaining(&self) -> Option<u32> {
		match self {
			AdmitVerdict::Allowed { remaining } => Some(*remaining),
			AdmitVerdict::Rejected { .. } => None,
		}
	}

	/// Retry hint in whole seconds after a rejected admission.
	pub const fn retry_after_secs(&self) -> Option<u64> {
		match self {
			AdmitVerdict::Allowed { .. } => None,
			AdmitVerdict::Rejected { retry_after_secs } => Some(*retry_after_secs),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BucketKey {
	policy: &'static str,
	client: ClientKey,
}

/// Keyed registry of token buckets, one per (policy class, client key) pair.
///
/// Buckets are created lazily and exactly once per key; mutation is serialized per
/// bucket so admissions for different keys never block each other. The registry is
/// process-local (cross-instance rate limiting is out of scope).
#[derive(Debug, Default)]
pub struct RateLimiter {
	registry: Mutex<HashMap<BucketKey, Arc<Mutex<Bucket>>>>,
}
impl RateLimiter {
	/// Creates an empty limiter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Checks admission for the (policy, client) pair at the current UTC instant.
	///
	/// Never fails; a missing bucket is created transparently.
	pub fn admit(&self, policy: &PolicyClass, client: &ClientKey) -> AdmitVerdict {
		self.admit_at(policy, client, OffsetDateTime::now_utc())
	}

	/// Checks admission using an explicit instant (deterministic in tests).
	pub fn admit_at(
		&self,
		policy: &PolicyClass,
		client: &ClientKey,
		now: OffsetDateTime,
	) -> AdmitVerdict {
		let _guard = OpSpan::new(OpKind::Admit, "admit_at").entered();
		let bucket = self.bucket_for(policy, client, now);
		let verdict = bucket.lock().try_admit(policy, now);

		obs::record_op_outcome(
			OpKind::Admit,
			if verdict.is_allowed() { OpOutcome::Success } else { OpOutcome::Denied },
		);

		verdict
	}

	/// Drops all bucket state for the provided client across every policy class.
	///
	/// Administrative/test-only; the next admission starts from a full bucket.
	pub fn reset(&self, client: &ClientKey) {
		self.registry.lock().retain(|key, _| key.client != *client);
	}

	/// Drops every bucket immediately.
	pub fn reset_all(&self) {
		self.registry.lock().clear();
	}

	/// Evicts buckets idle since before `idle_for` ago, bounding registry growth.
	pub fn evict_idle(&self, idle_for: Duration) {
		self.evict_idle_at(OffsetDateTime::now_utc(), idle_for);
	}

	/// Eviction variant taking an explicit instant.
	///
	/// A bucket is idle once a whole `idle_for` has passed since its interval anchor
	/// was last advanced; active buckets are untouched, and an evicted key simply
	/// starts fresh on its next admission.
	pub fn evict_idle_at(&self, now: OffsetDateTime, idle_for: Duration) {
		self.registry.lock().retain(|_, bucket| now - bucket.lock().last_refill() < idle_for);
	}

	/// Number of live buckets; exposed for capacity monitoring.
	pub fn bucket_count(&self) -> usize {
		self.registry.lock().len()
	}

	// Atomic get-or-create: concurrent first admissions for one key observe exactly
	// one bucket. The registry lock is held only for the lookup, never during the
	// per-bucket critical section.
	fn bucket_for(
		&self,
		policy: &PolicyClass,
		client: &ClientKey,
		now: OffsetDateTime,
	) -> Arc<Mutex<Bucket>> {
		let key = BucketKey { policy: policy.name(), client: client.clone() };
		let mut registry = self.registry.lock();

		registry
			.entry(key)
			.or_insert_with(|| Arc::new(Mutex::new(Bucket::new(policy, now))))
			.clone()
	}
}
