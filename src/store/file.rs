//! Simple file-backed [`TokenStore`] for lightweight deployments.
//!
//! Stands in for the relational store of larger installations: records reload on open
//! and every mutation rewrites the snapshot atomically (tmp file + rename).

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{MarkUsedOutcome, StoreError, StoreFuture, TokenStore},
	token::{SubjectId, TokenPurpose, TokenRecord, TokenState, TokenValue},
};

/// Persists token records to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<TokenValue, TokenRecord>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<TokenValue, TokenRecord>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		let entries: Vec<TokenRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|record| (record.value.clone(), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<TokenValue, TokenRecord>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.values().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn replace_active(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let conflict = guard
				.get(record.value.expose())
				.is_some_and(|existing| existing.subject != record.subject);

			if conflict {
				return Err(StoreError::Conflict {
					message: "token value is already bound to another subject".into(),
				});
			}

			guard.retain(|_, held| {
				held.subject != record.subject || held.purpose != record.purpose
			});
			guard.insert(record.value.clone(), record);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn find_by_value<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move {
			Ok(self.inner.read().get(value).filter(|record| record.purpose == purpose).cloned())
		})
	}

	fn find_active<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move {
			Ok(self
				.inner
				.read()
				.values()
				.find(|record| {
					record.subject == *subject
						&& record.purpose == purpose
						&& record.is_active_at(instant)
				})
				.cloned())
		})
	}

	fn mark_used<'a>(
		&'a self,
		value: &'a str,
		purpose: TokenPurpose,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let Some(record) = guard.get_mut(value).filter(|r| r.purpose == purpose) else {
				return Ok(MarkUsedOutcome::Missing);
			};
			let outcome = match record.state_at(instant) {
				TokenState::Used => MarkUsedOutcome::AlreadyUsed,
				TokenState::Expired => {
					guard.remove(value);
					self.persist_locked(&guard)?;

					MarkUsedOutcome::Expired
				},
				TokenState::Active => {
					record.mark_used(instant);

					let subject = record.subject.clone();

					self.persist_locked(&guard)?;

					MarkUsedOutcome::Updated { subject }
				},
			};

			Ok(outcome)
		})
	}

	fn delete_for_subject<'a>(
		&'a self,
		subject: &'a SubjectId,
		purpose: TokenPurpose,
	) -> StoreFuture<'a, u64> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let before = guard.len();

			guard.retain(|_, record| record.subject != *subject || record.purpose != purpose);

			let removed = (before - guard.len()) as u64;

			if removed > 0 {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}

	fn delete_expired_before(&self, instant: OffsetDateTime) -> StoreFuture<'_, u64> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let before = guard.len();

			guard.retain(|_, record| record.expires_at >= instant);

			let removed = (before - guard.len()) as u64;

			if removed > 0 {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}
}
