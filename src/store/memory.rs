//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{MarkUsedOutcome, StoreError, StoreFuture, TokenStore},
	token::{SubjectId, TokenPurpose, TokenRecord, TokenState, TokenValue},
};

type StoreMap = Arc<RwLock<HashMap<TokenValue, TokenRecord>>>;

/// Thread-safe storage backend that keeps records in-process.
///
/// Every trait operation runs as a single lock-held unit, which is what makes the
/// delete-then-insert and check-then-transition contracts atomic here.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn replace_active_now(map: StoreMap, record: TokenRecord) -> Result<(), StoreError> {
		let mut guard = map.write();

		let conflict = guard
			.get(record.value.expose())
			.is_some_and(|existing| existing.subject != record.subject);

		if conflict {
			return Err(StoreError::Conflict {
				message: "token value is already bound to another subject".into(),
			});
		}

		guard.retain(|_, held| held.subject != record.subject || held.purpose != record.purpose);
		guard.insert(record.value.clone(), record);

		Ok(())
	}

	fn find_by_value_now(
		map: StoreMap,
		value: String,
		purpose: TokenPurpose,
	) -> Option<TokenRecord> {
		map.read().get(value.as_str()).filter(|record| record.purpose == purpose).cloned()
	}

	fn find_active_now(
		map: StoreMap,
		subject: SubjectId,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> Option<TokenRecord> {
		map.read()
			.values()
			.find(|record| {
				record.subject == subject
					&& record.purpose == purpose
					&& record.is_active_at(instant)
			})
			.cloned()
	}

	fn mark_used_now(
		map: StoreMap,
		value: String,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> MarkUsedOutcome {
		let mut guard = map.write();
		let Some(record) = guard.get_mut(value.as_str()).filter(|r| r.purpose == purpose) else {
			return MarkUsedOutcome::Missing;
		};

		match record.state_at(instant) {
			TokenState::Used => MarkUsedOutcome::AlreadyUsed,
			TokenState::Expired => {
				guard.remove(value.as_str());

				MarkUsedOutcome::Expired
			},
			TokenState::Active => {
				record.mark_used(instant);

				let subject = record.subject.clone();

				MarkUsedOutcome::Updated { subject }
			},
		}
	}

	fn delete_for_subject_now(map: StoreMap, subject: SubjectId, purpose: TokenPurpose) -> u64 {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, record| record.subject != subject || record.purpose != purpose);

		(before - guard.len()) as u64
	}

	fn delete_expired_before_now(map: StoreMap, instant: OffsetDateTime) -> u64 {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, record| record.expires_at >= instant);

		(before - guard.len()) as u64
	}
}
impl TokenStore for MemoryStore {
	fn replace_active(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::replace_active_now(map, record) })
	}

	fn find_by_value<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let value = value.to_owned();

		Box::pin(async move { Ok(Self::find_by_value_now(map, value, purpose)) })
	}

	fn find_active<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let subject = subject.to_owned();

		Box::pin(async move { Ok(Self::find_active_now(map, subject, purpose, instant)) })
	}

	fn mark_used<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome> {
		let map = self.0.clone();
		let value = value.to_owned();

		Box::pin(async move { Ok(Self::mark_used_now(map, value, purpose, instant)) })
	}

	fn delete_for_subject<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, u64> {
		let map = self.0.clone();
		let subject = subject.to_owned();

		Box::pin(async move { Ok(Self::delete_for_subject_now(map, subject, purpose)) })
	}

	fn delete_expired_before(&self, instant: OffsetDateTime) -> StoreFuture<'_, u64> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::delete_expired_before_now(map, instant)) })
	}
}
