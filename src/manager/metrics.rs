// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token-manager activity.
#[derive(Debug, Default)]
pub struct ManagerMetrics {
	issued: AtomicU64,
	consumed: AtomicU64,
	swept: AtomicU64,
}
impl ManagerMetrics {
	/// Returns the total number of tokens issued.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens consumed successfully.
	pub fn consumed(&self) -> u64 {
		self.consumed.load(Ordering::Relaxed)
	}

	/// Returns the total number of records removed by sweeps.
	pub fn swept(&self) -> u64 {
		self.swept.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_consumed(&self) {
		self.consumed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_swept(&self, removed: u64) {
		self.swept.fetch_add(removed, Ordering::Relaxed);
	}
}
