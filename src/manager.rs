//! Ephemeral token lifecycle orchestration: issue, validate, consume, sweep.
//!
//! The manager is purpose-agnostic: the three production purposes share one code
//! path, with per-purpose TTLs supplied by a [`TtlPolicy`] rather than baked in.
//! Issuance acquires a per-(subject, purpose) singleflight guard on top of the
//! store's atomic replace, so two concurrent issuances can never leave two live
//! tokens; consumption relies entirely on the store's conditional transition for
//! its exactly-once guarantee.

mod metrics;

pub use metrics::ManagerMetrics;

// self
use crate::{
	_prelude::*,
	error::TokenError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{MarkUsedOutcome, TokenStore},
	token::{SubjectId, TokenPurpose, TokenRecord, TokenValue, TtlPolicy},
};

#[derive(Clone, PartialEq, Eq, Hash)]
struct IssueKey {
	subject: SubjectId,
	purpose: TokenPurpose,
}

/// Issues, validates, consumes, and expires single-use tokens atop a [`TokenStore`].
#[derive(Clone)]
pub struct TokenManager {
	store: Arc<dyn TokenStore>,
	ttl: TtlPolicy,
	metrics: Arc<ManagerMetrics>,
	issue_guards: Arc<Mutex<HashMap<IssueKey, Arc<AsyncMutex<()>>>>>,
}
impl TokenManager {
	/// Creates a manager over the provided store with the production TTL policy.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self {
			store,
			ttl: TtlPolicy::default(),
			metrics: Default::default(),
			issue_guards: Default::default(),
		}
	}

	/// Replaces the TTL policy.
	pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
		self.ttl = ttl;

		self
	}

	/// Shared activity counters.
	pub fn metrics(&self) -> Arc<ManagerMetrics> {
		self.metrics.clone()
	}

	/// Issues a token using the policy TTL for the purpose.
	///
	/// Any pre-existing active token for the same (subject, purpose) is invalidated
	/// first, upholding the at-most-one-active-token invariant.
	pub async fn issue(&self, subject: SubjectId, purpose: TokenPurpose) -> Result<TokenValue> {
		self.issue_with_ttl(subject, purpose, self.ttl.ttl_for(purpose)).await
	}

	/// Issues a token with a caller-supplied TTL (refresh-session tokens and tests).
	pub async fn issue_with_ttl(
		&self,
		subject: SubjectId,
		purpose: TokenPurpose,
		ttl: Duration,
	) -> Result<TokenValue> {
		self.issue_with_ttl_at(subject, purpose, ttl, OffsetDateTime::now_utc()).await
	}

	/// Issuance variant taking an explicit instant (deterministic in tests).
	pub async fn issue_with_ttl_at(
		&self,
		subject: SubjectId,
		purpose: TokenPurpose,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<TokenValue> {
		const KIND: OpKind = OpKind::Issue;

		let span = OpSpan::new(KIND, "issue_with_ttl_at");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let record =
					TokenRecord::issue(TokenValue::generate(), subject, purpose, now, ttl)
						.map_err(Error::from)?;
				let value = record.value.clone();
				let key =
					IssueKey { subject: record.subject.clone(), purpose: record.purpose };
				let guard = self.issue_guard(&key);
				let _singleflight = guard.lock().await;

				self.store.replace_active(record).await?;
				self.metrics.record_issued();

				Ok(value)
			})
			.await;

		obs::record_op_outcome(
			KIND,
			if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure },
		);

		result
	}

	/// Read-only validity check: `true` iff a token with that value and purpose
	/// exists and is active right now.
	///
	/// Repeatable; never mutates state, so callers may pre-check before showing a
	/// reset form and still consume afterwards.
	pub async fn validate(&self, value: &str, purpose: TokenPurpose) -> Result<bool> {
		self.validate_at(value, purpose, OffsetDateTime::now_utc()).await
	}

	/// Validation variant taking an explicit instant.
	pub async fn validate_at(
		&self,
		value: &str,
		purpose: TokenPurpose,
		now: OffsetDateTime,
	) -> Result<bool> {
		let span = OpSpan::new(OpKind::Validate, "validate_at");
		let found = span.instrument(self.store.find_by_value(value, purpose)).await?;

		Ok(found.is_some_and(|record| record.is_active_at(now)))
	}

	/// Atomically consumes the token and returns its subject.
	///
	/// Fails with [`TokenError::NotFound`], [`TokenError::AlreadyUsed`], or
	/// [`TokenError::Expired`]; an expired record is deleted as a side effect.
	/// Under N concurrent calls for one value exactly one succeeds.
	pub async fn consume(&self, value: &str, purpose: TokenPurpose) -> Result<SubjectId> {
		self.consume_at(value, purpose, OffsetDateTime::now_utc()).await
	}

	/// Consumption variant taking an explicit instant.
	pub async fn consume_at(
		&self,
		value: &str,
		purpose: TokenPurpose,
		now: OffsetDateTime,
	) -> Result<SubjectId> {
		const KIND: OpKind = OpKind::Consume;

		let span = OpSpan::new(KIND, "consume_at");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.store.mark_used(value, purpose, now).await? {
					MarkUsedOutcome::Updated { subject } => {
						self.metrics.record_consumed();

						Ok(subject)
					},
					MarkUsedOutcome::Missing => Err(TokenError::NotFound.into()),
					MarkUsedOutcome::AlreadyUsed => Err(TokenError::AlreadyUsed.into()),
					MarkUsedOutcome::Expired => Err(TokenError::Expired.into()),
				}
			})
			.await;

		obs::record_op_outcome(
			KIND,
			match &result {
				Ok(_) => OpOutcome::Success,
				Err(Error::Token(_)) => OpOutcome::Denied,
				Err(_) => OpOutcome::Failure,
			},
		);

		result
	}

	/// Returns the record currently active for the (subject, purpose) pair, if any.
	pub async fn active_record(
		&self,
		subject: &SubjectId,
		purpose: TokenPurpose,
	) -> Result<Option<TokenRecord>> {
		Ok(self.store.find_active(subject, purpose, OffsetDateTime::now_utc()).await?)
	}

	/// Drops every token for the (subject, purpose) pair, returning the count removed.
	///
	/// Backs logout-style flows that revoke all refresh-session tokens at once.
	pub async fn invalidate(&self, subject: &SubjectId, purpose: TokenPurpose) -> Result<u64> {
		Ok(self.store.delete_for_subject(subject, purpose).await?)
	}

	/// Deletes every token with `expires_at` before now, regardless of state.
	///
	/// Complementary to the consume-path cleanup: the sweep bounds total storage for
	/// tokens nobody touches again, and is meant to be driven by an external
	/// scheduler or invoked opportunistically.
	pub async fn sweep(&self) -> Result<u64> {
		self.sweep_at(OffsetDateTime::now_utc()).await
	}

	/// Sweep variant taking an explicit instant.
	pub async fn sweep_at(&self, now: OffsetDateTime) -> Result<u64> {
		const KIND: OpKind = OpKind::Sweep;

		let span = OpSpan::new(KIND, "sweep_at");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let removed = self.store.delete_expired_before(now).await?;

				self.metrics.record_swept(removed);

				Ok(removed)
			})
			.await;

		obs::record_op_outcome(
			KIND,
			if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure },
		);

		result
	}

	// Returns (and creates on demand) the singleflight guard for an issuance key.
	fn issue_guard(&self, key: &IssueKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.issue_guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager").field("ttl", &self.ttl).finish()
	}
}
