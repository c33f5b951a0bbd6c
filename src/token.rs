//! Token-domain identifiers, purposes, values, and records.

pub mod id;
pub mod purpose;
pub mod record;
pub mod value;

pub use id::*;
pub use purpose::*;
pub use record::*;
pub use value::*;
