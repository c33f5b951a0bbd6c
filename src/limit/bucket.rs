//! Per-key token-bucket state with intervally (whole-interval) refill.

// self
use crate::{
	_prelude::*,
	limit::{AdmitVerdict, PolicyClass},
};

/// Rate-limiting state for one (policy class, client key) pair.
///
/// Refill is computed lazily from elapsed time on every admission check; no bucket
/// ever owns a timer. `tokens_available` never exceeds the policy capacity.
#[derive(Clone, Debug)]
pub(crate) struct Bucket {
	tokens_available: u32,
	last_refill: OffsetDateTime,
}
impl Bucket {
	/// Creates a full bucket whose first interval starts at `now`.
	pub(crate) fn new(policy: &PolicyClass, now: OffsetDateTime) -> Self {
		Self { tokens_available: policy.capacity(), last_refill: now }
	}

	/// Attempts to consume one token at `now`, refilling first if a whole interval
	/// has elapsed.
	pub(crate) fn try_admit(&mut self, policy: &PolicyClass, now: OffsetDateTime) -> AdmitVerdict {
		self.refill(policy, now);

		if self.tokens_available >= 1 {
			self.tokens_available -= 1;

			return AdmitVerdict::Allowed { remaining: self.tokens_available };
		}

		let next_refill = self.last_refill + policy.refill_interval();
		let wait = next_refill - now;
		// Rounded down to whole seconds; a denial never reports a negative wait.
		let retry_after_secs = wait.whole_seconds().max(0) as u64;

		AdmitVerdict::Rejected { retry_after_secs }
	}

	/// Instant the current interval started; used for idle-bucket eviction.
	pub(crate) fn last_refill(&self) -> OffsetDateTime {
		self.last_refill
	}

	// Intervally refill: a full reset to capacity once one or more whole intervals
	// have elapsed, never a continuous trickle.
	fn refill(&mut self, policy: &PolicyClass, now: OffsetDateTime) {
		let elapsed = now - self.last_refill;
		let interval = policy.refill_interval();

		if elapsed < interval {
			return;
		}

		let interval_ns = interval.whole_nanoseconds();
		let whole_intervals = elapsed.whole_nanoseconds() / interval_ns;

		self.tokens_available = policy.capacity();
		self.last_refill += Duration::nanoseconds((whole_intervals * interval_ns) as i64);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const POLICY: PolicyClass = PolicyClass::GENERAL;

	#[test]
	fn refill_is_intervally_not_continuous() {
		let start = macros::datetime!(2025-06-01 00:00 UTC);
		let mut bucket = Bucket::new(&POLICY, start);

		for _ in 0..POLICY.capacity() {
			assert!(bucket.try_admit(&POLICY, start).is_allowed());
		}

		// Half an interval restores nothing.
		let halfway = start + Duration::seconds(30);

		assert!(!bucket.try_admit(&POLICY, halfway).is_allowed());

		// A whole interval restores the full capacity at once.
		let later = start + Duration::minutes(1);

		assert_eq!(
			bucket.try_admit(&POLICY, later),
			AdmitVerdict::Allowed { remaining: POLICY.capacity() - 1 },
		);
	}

	#[test]
	fn last_refill_advances_by_whole_intervals_only() {
		let start = macros::datetime!(2025-06-01 00:00 UTC);
		let mut bucket = Bucket::new(&POLICY, start);

		// 2.5 intervals later the window anchor lands on exactly two intervals.
		let later = start + Duration::seconds(150);

		bucket.try_admit(&POLICY, later);

		assert_eq!(bucket.last_refill(), start + Duration::minutes(2));
	}

	#[test]
	fn rejection_reports_wait_until_next_refill() {
		let start = macros::datetime!(2025-06-01 00:00 UTC);
		let policy = PolicyClass::new("tiny", 1, Duration::seconds(60))
			.expect("Test policy should be valid.");
		let mut bucket = Bucket::new(&policy, start);

		assert!(bucket.try_admit(&policy, start).is_allowed());

		let denied_at = start + Duration::seconds(12);

		assert_eq!(
			bucket.try_admit(&policy, denied_at),
			AdmitVerdict::Rejected { retry_after_secs: 48 },
		);
	}
}
