//! Storage contracts and built-in store implementations for ephemeral token records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	token::{SubjectId, TokenPurpose, TokenRecord},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for ephemeral token records.
///
/// Implementations must honor two atomicity guarantees on which the manager relies:
///
/// - [`replace_active`](Self::replace_active) performs delete-existing-then-insert for a
///   (subject, purpose) pair as one serializable unit, so two concurrent issuances can
///   never leave two live tokens behind.
/// - [`mark_used`](Self::mark_used) performs its check-then-transition conditionally, so
///   N concurrent consumers of the same value observe exactly one
///   [`MarkUsedOutcome::Updated`].
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Atomically deletes every record for the record's (subject, purpose) pair and
	/// inserts the replacement.
	///
	/// Fails with [`StoreError::Conflict`] if another subject already holds the value.
	fn replace_active(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record with the provided value and purpose, if present.
	fn find_by_value<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Fetches the record that is active at `instant` for the (subject, purpose) pair.
	fn find_active<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Atomically transitions the record to used if it is still active at `instant`.
	///
	/// An expired record is deleted as a side effect ("garbage collect on touch").
	fn mark_used<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome>;

	/// Deletes every record for the (subject, purpose) pair, returning the count removed.
	fn delete_for_subject<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, u64>;

	/// Deletes every record with `expires_at < instant` regardless of state, returning
	/// the count removed.
	fn delete_expired_before(&self, instant: OffsetDateTime) -> StoreFuture<'_, u64>;
}

/// Result of a conditional [`TokenStore::mark_used`] transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkUsedOutcome {
	/// The record was active and has been transitioned to used.
	Updated {
		/// Subject the consumed token was issued on behalf of.
		subject: SubjectId,
	},
	/// No record matched the provided value and purpose.
	Missing,
	/// The record exists but was already consumed.
	AlreadyUsed,
	/// The record had expired; it has been deleted.
	Expired,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Uniqueness violation on a token value.
	#[error("Conflict: {message}.")]
	Conflict {
		/// Human-readable error payload.
		message: String,
	},
}
