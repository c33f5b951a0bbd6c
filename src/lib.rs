//! Admission control for authentication endpoints: per-client token-bucket rate limiting
//! and single-use ephemeral token lifecycles in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admission;
pub mod error;
pub mod limit;
pub mod manager;
pub mod obs;
pub mod store;
pub mod token;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}
