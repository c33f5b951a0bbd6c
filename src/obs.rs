//! Optional observability helpers for admission and token operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `authgate.op` with the `op`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `authgate_op_total` counter for every
//!   attempt/success/denial/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Rate-limit admission check.
	Admit,
	/// Token issuance.
	Issue,
	/// Read-only token validation.
	Validate,
	/// Single-use token consumption.
	Consume,
	/// Bulk expiry sweep.
	Sweep,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Admit => "admit",
			OpKind::Issue => "issue",
			OpKind::Validate => "validate",
			OpKind::Consume => "consume",
			OpKind::Sweep => "sweep",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Expected rejection (rate-limit denial, invalid token); never severe.
	Denied,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Denied => "denied",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
