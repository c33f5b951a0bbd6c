// std
use std::{sync::Arc, thread};
// crates.io
use time::{Duration, macros};
// self
use authgate::{
	admission::{AdmissionFilter, AdmissionOutcome, RouteTable},
	limit::{AdmitVerdict, PolicyClass, RateLimiter},
	token::ClientKey,
};

fn client(view: &str) -> ClientKey {
	ClientKey::new(view).expect("Failed to build client key for limiter tests.")
}

#[test]
fn bucket_drains_then_refills_intervally() {
	let limiter = RateLimiter::new();
	let policy =
		PolicyClass::new("it-3-per-60s", 3, Duration::seconds(60)).expect("Policy should build.");
	let key = client("203.0.113.1");
	let start = macros::datetime!(2025-06-01 00:00 UTC);

	for expected_remaining in [2, 1, 0] {
		assert_eq!(
			limiter.admit_at(&policy, &key, start),
			AdmitVerdict::Allowed { remaining: expected_remaining },
		);
	}

	// A fourth call within the same interval is rejected with the wait to the next
	// full refill.
	assert_eq!(
		limiter.admit_at(&policy, &key, start),
		AdmitVerdict::Rejected { retry_after_secs: 60 },
	);
	assert_eq!(
		limiter.admit_at(&policy, &key, start + Duration::seconds(10)),
		AdmitVerdict::Rejected { retry_after_secs: 50 },
	);
	// One whole interval later the bucket is full again; this call drains one token
	// out of a refreshed three.
	assert_eq!(
		limiter.admit_at(&policy, &key, start + Duration::seconds(60)),
		AdmitVerdict::Allowed { remaining: 2 },
	);
}

#[test]
fn an_idle_interval_restores_full_capacity_not_more() {
	let limiter = RateLimiter::new();
	let policy =
		PolicyClass::new("it-2-per-30s", 2, Duration::seconds(30)).expect("Policy should build.");
	let key = client("203.0.113.2");
	let start = macros::datetime!(2025-06-01 00:00 UTC);

	limiter.admit_at(&policy, &key, start);

	// Many intervals pass untouched; the bucket caps at capacity, never accumulates.
	let much_later = start + Duration::minutes(30);

	assert_eq!(limiter.admit_at(&policy, &key, much_later), AdmitVerdict::Allowed {
		remaining: 1
	});
	assert_eq!(limiter.admit_at(&policy, &key, much_later), AdmitVerdict::Allowed {
		remaining: 0
	});
	assert!(!limiter.admit_at(&policy, &key, much_later).is_allowed());
}

#[test]
fn concurrent_admissions_never_exceed_capacity() {
	let limiter = Arc::new(RateLimiter::new());
	let policy =
		PolicyClass::new("it-race", 5, Duration::seconds(60)).expect("Policy should build.");
	let key = client("203.0.113.3");
	let now = macros::datetime!(2025-06-01 00:00 UTC);
	let mut handles = Vec::new();

	for _ in 0..16 {
		let limiter = limiter.clone();
		let key = key.clone();

		handles.push(thread::spawn(move || {
			(0..4).filter(|_| limiter.admit_at(&policy, &key, now).is_allowed()).count()
		}));
	}

	let allowed: usize =
		handles.into_iter().map(|h| h.join().expect("Admit thread should not panic.")).sum();

	assert_eq!(allowed, 5, "No token may be double-spent under a first-use race.");
}

#[test]
fn admission_filter_scenario_shapes_the_protocol_verdict() {
	let filter = AdmissionFilter::new(RouteTable::auth_defaults());
	let now = macros::datetime!(2025-06-01 00:00 UTC);
	let forwarded = Some("203.0.113.9, 10.0.0.2");

	for _ in 0..PolicyClass::PASSWORD_RESET.capacity() {
		assert!(matches!(
			filter.check_at("/api/auth/forgot-password", forwarded, "10.0.0.2", now),
			AdmissionOutcome::Admitted { .. },
		));
	}

	let AdmissionOutcome::Rejected { retry_after_secs, rejection } =
		filter.check_at("/api/auth/forgot-password", forwarded, "10.0.0.2", now)
	else {
		panic!("Exhausted password-reset bucket should reject.");
	};

	assert_eq!(retry_after_secs, 3_600);
	assert_eq!(rejection.error, "Too many requests");
	assert_eq!(rejection.message, "Rate limit exceeded. Try again in 3600 seconds");

	// The peer address alone maps to a different bucket and is still admitted.
	assert!(matches!(
		filter.check_at("/api/auth/forgot-password", None, "10.0.0.2", now),
		AdmissionOutcome::Admitted { .. },
	));
}

#[test]
fn reset_and_eviction_are_administrative_escapes() {
	let limiter = RateLimiter::new();
	let start = macros::datetime!(2025-06-01 00:00 UTC);
	let key = client("203.0.113.4");

	for _ in 0..PolicyClass::AUTH_REGISTER.capacity() {
		limiter.admit_at(&PolicyClass::AUTH_REGISTER, &key, start);
	}

	assert!(!limiter.admit_at(&PolicyClass::AUTH_REGISTER, &key, start).is_allowed());

	limiter.reset_all();

	assert!(limiter.admit_at(&PolicyClass::AUTH_REGISTER, &key, start).is_allowed());
	assert_eq!(limiter.bucket_count(), 1);

	limiter.evict_idle_at(start + Duration::days(1), Duration::hours(1));

	assert_eq!(limiter.bucket_count(), 0);
}
